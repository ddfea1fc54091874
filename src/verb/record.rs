use crate::error::VerbError;
use crate::types::commands::RecordCommand;
use crate::types::events::names;
use crate::types::{Command, Event};

pub(super) const TERMINAL_EVENTS: &[&str] = &[names::RECORDING_FINISHED, names::RECORDING_FAILED];

pub(super) fn command(args: &RecordCommand) -> Command {
    Command::Record(args.clone())
}

pub(super) fn outcome(event: Event) -> Result<Event, VerbError> {
    super::settle("record", names::RECORDING_FINISHED, event)
}

/// Location of the finished recording, from `data.uri` or a bare string.
pub fn recording_uri(event: &Event) -> Option<&str> {
    let data = event.data();
    data.get("uri")
        .and_then(|uri| uri.as_str())
        .or_else(|| data.as_str())
}
