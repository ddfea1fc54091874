//! Verb execution: post a command, wait for the event that reports its outcome.
//!
//! Every verb shares one engine. A [`VerbKind`] supplies what differs: the
//! command payload, the terminal event types, and how a terminal event maps to
//! success or a domain failure.
//!
//! Interest is registered before the command is posted, so the terminal event
//! cannot arrive ahead of its listener.

mod call;
mod dial;
mod gather;
mod play;
mod record;

use std::sync::Arc;
use std::time::Duration;

use crate::channel::CommandChannel;
use crate::error::VerbError;
use crate::registry::{CancelHandle, CorrelationRegistry, PendingOperation};
use crate::types::commands::{DialCommand, GatherCommand, PlayCommand, RecordCommand};
use crate::types::{Command, Event, LegId};

pub use gather::digits;
pub use play::media_uri;
pub use record::recording_uri;

/// Deadline for a terminal event when none is configured.
pub const DEFAULT_VERB_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq)]
pub enum VerbKind {
    Answer,
    Hangup,
    Play(PlayCommand),
    Gather(GatherCommand),
    Dial(DialCommand),
    Record(RecordCommand),
}

impl VerbKind {
    pub fn name(&self) -> &'static str {
        match self {
            VerbKind::Answer => "answer",
            VerbKind::Hangup => "hangup",
            VerbKind::Play(_) => "play",
            VerbKind::Gather(_) => "gather",
            VerbKind::Dial(_) => "dial",
            VerbKind::Record(_) => "record",
        }
    }

    pub fn command(&self) -> Command {
        match self {
            VerbKind::Answer => Command::Answer,
            VerbKind::Hangup => Command::Hangup,
            VerbKind::Play(args) => play::command(args),
            VerbKind::Gather(args) => gather::command(args),
            VerbKind::Dial(args) => dial::command(args),
            VerbKind::Record(args) => record::command(args),
        }
    }

    pub fn terminal_events(&self) -> &'static [&'static str] {
        match self {
            VerbKind::Answer => call::ANSWER_EVENTS,
            VerbKind::Hangup => call::HANGUP_EVENTS,
            VerbKind::Play(_) => play::TERMINAL_EVENTS,
            VerbKind::Gather(_) => gather::TERMINAL_EVENTS,
            VerbKind::Dial(_) => dial::TERMINAL_EVENTS,
            VerbKind::Record(_) => record::TERMINAL_EVENTS,
        }
    }

    fn outcome(&self, event: Event) -> Result<Event, VerbError> {
        match self {
            VerbKind::Answer => call::answer_outcome(event),
            VerbKind::Hangup => Ok(event),
            VerbKind::Play(_) => play::outcome(event),
            VerbKind::Gather(_) => gather::outcome(event),
            VerbKind::Dial(_) => dial::outcome(event),
            VerbKind::Record(_) => record::outcome(event),
        }
    }
}

/// Classifies a terminal event: `success` resolves, anything else is the
/// media server reporting failure.
fn settle(verb: &'static str, success: &str, event: Event) -> Result<Event, VerbError> {
    if event.event_type() == success {
        Ok(event)
    } else {
        Err(VerbError::MatchedFailure { verb, event })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerbState {
    Created,
    CommandSent,
    AwaitingEvent,
    Resolved,
    Failed,
    Cancelled,
}

/// One verb ready to run on one leg.
pub struct Verb {
    leg: LegId,
    kind: VerbKind,
    channel: Arc<dyn CommandChannel>,
    registry: CorrelationRegistry,
    timeout: Duration,
}

impl Verb {
    pub fn new(
        leg: LegId,
        kind: VerbKind,
        channel: Arc<dyn CommandChannel>,
        registry: CorrelationRegistry,
    ) -> Self {
        Self {
            leg,
            kind,
            channel,
            registry,
            timeout: DEFAULT_VERB_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn kind(&self) -> &VerbKind {
        &self.kind
    }

    /// Registers interest in the terminal events and posts the command.
    ///
    /// The verb's deadline starts here, so an invocation that is never awaited
    /// still releases its interest once the timeout passes. If the post fails
    /// the interest is retracted before the error returns.
    pub async fn start(self) -> Result<VerbInvocation, VerbError> {
        let verb = self.kind.name();
        tracing::debug!("{} on leg {}: {:?}", verb, self.leg, VerbState::Created);

        let pending = self
            .registry
            .register(&self.leg, self.kind.terminal_events().iter().copied(), self.timeout)
            .inspect_err(|e| tracing::error!("{} on leg {} failed: {}", verb, self.leg, e))?;

        if let Err(source) = self.channel.post(&self.leg, self.kind.command()).await {
            drop(pending);
            tracing::error!("{} on leg {} failed to post: {}", verb, self.leg, source);
            return Err(VerbError::TransportSend { verb, source });
        }

        let mut invocation = VerbInvocation {
            kind: self.kind,
            pending,
            state: VerbState::CommandSent,
        };
        invocation.transition(VerbState::AwaitingEvent);
        Ok(invocation)
    }

    pub async fn run(self) -> Result<Event, VerbError> {
        self.start().await?.outcome().await
    }
}

/// A verb whose command has been posted and which is waiting on its event.
pub struct VerbInvocation {
    kind: VerbKind,
    pending: PendingOperation,
    state: VerbState,
}

impl VerbInvocation {
    /// State before settlement, always `AwaitingEvent` once started. The
    /// settled state is returned by [`VerbInvocation::finish`].
    pub fn state(&self) -> VerbState {
        self.state
    }

    pub fn leg(&self) -> &LegId {
        self.pending.leg()
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.pending.cancel_handle()
    }

    fn transition(&mut self, next: VerbState) {
        tracing::debug!(
            "{} on leg {}: {:?} -> {:?}",
            self.kind.name(),
            self.pending.leg(),
            self.state,
            next
        );
        self.state = next;
    }

    /// Waits for the terminal event and maps it to the verb's result.
    pub async fn outcome(self) -> Result<Event, VerbError> {
        self.finish().await.1
    }

    /// Like [`VerbInvocation::outcome`], also returning the settled state:
    /// `Resolved`, `Failed` or `Cancelled`.
    pub async fn finish(self) -> (VerbState, Result<Event, VerbError>) {
        let VerbInvocation {
            kind,
            pending,
            state,
        } = self;
        let leg = pending.leg().clone();
        let verb = kind.name();

        let result = match pending.wait().await {
            Ok(event) => kind.outcome(event),
            Err(e) => Err(VerbError::from(e)),
        };
        let next = match &result {
            Ok(_) => VerbState::Resolved,
            Err(e) if e.is_cancelled() => VerbState::Cancelled,
            Err(_) => VerbState::Failed,
        };
        tracing::debug!("{} on leg {}: {:?} -> {:?}", verb, leg, state, next);
        (next, result)
    }
}
