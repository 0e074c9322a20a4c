pub mod reorder_schedule_command;

pub use reorder_schedule_command::ReorderScheduleCommand;
