mod checkpoint;
mod command_type;
mod display;
mod error_code;
mod memspace;
mod monitor_command;
mod monitor_event;
mod response;

pub use checkpoint::{CheckpointInfo, CheckpointSet, CpuOperation};
pub use command_type::{CommandType, EventType};
pub use display::{DisplayBuffer, DisplayFormat};
pub use error_code::ErrorCode;
pub use memspace::{Memspace, ResetKind};
pub use monitor_command::{Command, MemoryGet, MemorySet};
pub use monitor_event::MonitorEvent;
pub use response::{BankInfo, EmulatorInfo, RegisterValue, Response};
