pub use error::{Fault, LoadError, SessionError};
pub use instruction::Instruction;
pub use machine::Machine;
pub use session::{FrameSink, KeySource, Session, SessionConfig, TickReport};
pub use state::{FrameBuffer, Keys};

pub mod constants;
mod error;
mod instruction;
mod machine;
mod opcode;
mod operations;
mod session;
mod state;
