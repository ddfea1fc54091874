use crate::error::VerbError;
use crate::types::events::names;
use crate::types::Event;

pub(super) const ANSWER_EVENTS: &[&str] = &[names::CALL_ANSWERED, names::ANSWER_FAILED];

// A hangup only ever ends one way.
pub(super) const HANGUP_EVENTS: &[&str] = &[names::CALL_HUNG_UP];

pub(super) fn answer_outcome(event: Event) -> Result<Event, VerbError> {
    super::settle("answer", names::CALL_ANSWERED, event)
}
