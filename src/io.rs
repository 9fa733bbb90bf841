use std::fs;
use std::path::Path;

use crate::error::CommandError;

/// One operator command, already tokenized and with numbers parsed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    InitMemory(i64),
    Alloc(i64),
    Free(i64),
    FreeAddr(i64),
    Strategy(String),
    Policy(String),
    Load(i64),
    Translate(i64),
    DumpMemory,
    DumpPages,
    DumpTlb,
    DumpCache,
    Stats,
    StatsJson,
    Help,
    Exit,
}

impl Command {
    /// Parse one input line. Blank lines and `#` comments yield `None`.
    pub fn parse(line: &str) -> Result<Option<Command>, CommandError> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }

        let tokens: Vec<&str> = line.split_whitespace().collect();
        let command = match tokens.as_slice() {
            ["exit"] => Command::Exit,
            ["help"] => Command::Help,
            ["show"] | ["dump", "memory"] => Command::DumpMemory,
            ["dump", "pages"] => Command::DumpPages,
            ["dump", "tlb"] => Command::DumpTlb,
            ["dump", "cache"] => Command::DumpCache,
            ["stats"] => Command::Stats,
            ["stats", "json"] => Command::StatsJson,

            ["init", "memory", size] => Command::InitMemory(number(line, size)?),
            ["init", ..] => return Err(CommandError::Usage("init memory <size>")),

            ["alloc" | "malloc", size] => Command::Alloc(number(line, size)?),
            ["alloc" | "malloc", ..] => return Err(CommandError::Usage("alloc <size>")),

            ["free", "addr", address] => Command::FreeAddr(number(line, address)?),
            ["free", "addr"] => return Err(CommandError::Usage("free <id> OR free addr <address>")),
            ["free", id] => Command::Free(number(line, id)?),
            ["free", ..] => return Err(CommandError::Usage("free <id> OR free addr <address>")),

            ["strategy", name] => Command::Strategy(name.to_string()),
            ["strategy", ..] => return Err(CommandError::Usage("strategy first|best|worst")),

            ["policy", name] => Command::Policy(name.to_string()),
            ["policy", ..] => return Err(CommandError::Usage("policy fifo|lru")),

            ["load", page] => Command::Load(number(line, page)?),
            ["load", ..] => return Err(CommandError::Usage("load <page>")),

            ["translate", va] => Command::Translate(number(line, va)?),
            ["translate", ..] => return Err(CommandError::Usage("translate <virtual_address>")),

            _ => return Err(CommandError::Unknown(line.to_string())),
        };
        Ok(Some(command))
    }
}

fn number(command: &str, token: &str) -> Result<i64, CommandError> {
    token.parse().map_err(|_| CommandError::InvalidNumber {
        command: command.to_string(),
        value: token.to_string(),
    })
}

/// Read a command script, one command per line
pub fn read_script<P: AsRef<Path>>(path: P) -> Result<Vec<String>, CommandError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| CommandError::Script {
        path: path.display().to_string(),
        source,
    })?;
    Ok(content.lines().map(str::to_string).collect())
}
