pub mod cache;
pub mod console;
pub mod constants;
pub mod error;
pub mod eviction;
pub mod heap;
pub mod io;
pub mod logging;
pub mod memory;
pub mod simulator;
pub mod translation;
pub mod vm_manager;

// Re-export commonly used items for convenience
pub use constants::*;
pub use error::{CommandError, Result, SimError};
pub use simulator::{SimConfig, Simulator, Stats};
pub use translation::{Translation, VirtualAddress};
