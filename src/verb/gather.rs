use crate::error::VerbError;
use crate::types::commands::GatherCommand;
use crate::types::events::names;
use crate::types::{Command, Event};

pub(super) const TERMINAL_EVENTS: &[&str] = &[names::GATHER_FINISHED, names::GATHER_FAILED];

pub(super) fn command(args: &GatherCommand) -> Command {
    Command::Gather(args.clone())
}

pub(super) fn outcome(event: Event) -> Result<Event, VerbError> {
    super::settle("gather", names::GATHER_FINISHED, event)
}

/// Digits collected by a gather. The media server reports them either as the
/// bare `data` string or as `{"digits": ...}`. No input yields an empty string.
pub fn digits(event: &Event) -> String {
    let data = event.data();
    let digits = data
        .as_str()
        .or_else(|| data.get("digits").and_then(|d| d.as_str()));
    match digits {
        Some(digits) => digits.to_string(),
        None if data.is_number() => data.to_string(),
        None => String::new(),
    }
}
