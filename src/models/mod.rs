pub mod sheep;
pub mod tool;

pub use sheep::{SheepConfig, SheepSummary};
pub use tool::ToolKind;
