pub mod commands;
pub mod events;
mod leg;

pub use commands::{Command, CommandEnvelope};
pub use events::Event;
pub use leg::LegId;
