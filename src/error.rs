use thiserror::Error;

/// Conditions signalled by the simulator core.
///
/// Every variant is recoverable: the simulator stays usable after any of them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimError {
    #[error("Invalid size: {0}. Size must be positive")]
    InvalidSize(i64),

    #[error("Memory not initialized. Use 'init memory <size>'")]
    NotInitialized,

    #[error("Not enough memory for {requested} bytes")]
    OutOfMemory { requested: usize },

    #[error("Invalid block id: {0}")]
    UnknownId(i64),

    #[error("No allocated block starts at address {0}")]
    UnknownAddress(i64),

    #[error("Unknown strategy '{0}'. Use: first | best | worst")]
    UnknownStrategy(String),

    #[error("Unknown policy '{0}'. Use: fifo | lru")]
    UnknownPolicy(String),

    #[error("Invalid page number {page}. Valid range: 0 - {max}")]
    InvalidPage { page: i64, max: usize },

    #[error("Invalid virtual address {0}")]
    AddressOutOfRange(i64),

    #[error("Page fault at page {0}")]
    PageFault(usize),

    /// Every frame is marked used but no resident page owns one.
    #[error("No frame could be freed for page {0}")]
    NoEvictableFrame(usize),
}

pub type Result<T> = std::result::Result<T, SimError>;

/// Malformed operator input. Never produced by the core.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Received command: {0}")]
    Unknown(String),

    #[error("Usage: {0}")]
    Usage(&'static str),

    #[error("Invalid number '{value}' in '{command}'")]
    InvalidNumber { command: String, value: String },

    #[error("Failed to read script {path}: {source}")]
    Script {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
