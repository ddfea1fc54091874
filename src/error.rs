use std::time::Duration;

use crate::types::{Event, LegId};

/// Failures of the outbound command channel.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("not connected yet")]
    NotConnected,
    #[error("command channel closed")]
    Closed,
    #[error("failed to serialize command: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Failures of a pending operation waiting on the event stream.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CorrelationError {
    #[error("no matching event for leg {leg} within {timeout:?}")]
    Timeout { leg: LegId, timeout: Duration },
    #[error("operation on leg {leg} was cancelled")]
    Cancelled { leg: LegId },
    #[error("leg {leg} already has a pending operation waiting on {event_type}")]
    DuplicateInterest { leg: LegId, event_type: String },
    #[error("operation on leg {leg} registered no event types")]
    NoInterest { leg: LegId },
}

#[derive(Debug, thiserror::Error)]
pub enum VerbError {
    #[error("failed to post {verb} command: {source}")]
    TransportSend {
        verb: &'static str,
        #[source]
        source: TransportError,
    },
    #[error(transparent)]
    Correlation(#[from] CorrelationError),
    /// The media server answered with one of the verb's failure events.
    #[error("media server reported {} for {verb} on leg {}", .event.event_type(), .event.leg_id())]
    MatchedFailure { verb: &'static str, event: Event },
    #[error("failed to prepare media: {0:#}")]
    Media(anyhow::Error),
}

impl VerbError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, VerbError::Correlation(CorrelationError::Timeout { .. }))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, VerbError::Correlation(CorrelationError::Cancelled { .. }))
    }
}
