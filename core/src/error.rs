use thiserror::Error;

use crate::constants::MAX_ROM_SIZE;

/// A fatal condition raised while executing an instruction.
///
/// Once a `Machine` faults it stays halted; the owner decides whether to tear it down
/// or start a fresh one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Fault {
    #[error("unsupported opcode {opcode:#06X} at pc {pc:#06X}")]
    UnsupportedOpcode { opcode: u16, pc: u16 },

    #[error("return with an empty call stack at pc {pc:#06X}")]
    StackUnderflow { pc: u16 },

    #[error("call stack exhausted at pc {pc:#06X}")]
    StackOverflow { pc: u16 },
}

/// Failures while copying a ROM into a `Machine`
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("ROM is {size} bytes but at most {} fit in memory", MAX_ROM_SIZE)]
    RomTooLarge { size: usize },

    #[error("a ROM has already been loaded into this machine")]
    AlreadyLoaded,

    #[error("failed to read ROM")]
    Io(#[from] std::io::Error),
}

/// Failures while driving a `Session` for one tick
#[derive(Debug, Error)]
pub enum SessionError<E>
where
    E: std::error::Error + 'static,
{
    #[error(transparent)]
    Fault(#[from] Fault),

    #[error("failed to present frame")]
    Sink(#[source] E),
}
