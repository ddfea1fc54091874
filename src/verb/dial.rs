use crate::error::VerbError;
use crate::types::commands::DialCommand;
use crate::types::events::names;
use crate::types::{Command, Event};

pub(super) const TERMINAL_EVENTS: &[&str] = &[names::DIAL_ANSWERED, names::DIAL_FAILED];

pub(super) fn command(args: &DialCommand) -> Command {
    Command::Dial(args.clone())
}

pub(super) fn outcome(event: Event) -> Result<Event, VerbError> {
    super::settle("dial", names::DIAL_ANSWERED, event)
}
