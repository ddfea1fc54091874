use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use crate::channel::CommandChannel;
use crate::error::VerbError;
use crate::registry::CorrelationRegistry;
use crate::tts::SpeechResolver;
use crate::types::commands::{DialCommand, GatherCommand, PlayCommand, RecordCommand};
use crate::types::{Event, LegId};
use crate::verb::{self, Verb, VerbKind, DEFAULT_VERB_TIMEOUT};

/// Verbs bound to one call leg. Each call waits until the media server reports
/// the outcome, the operation times out, or it is cancelled.
#[derive(Clone)]
pub struct Voice {
    leg: LegId,
    channel: Arc<dyn CommandChannel>,
    registry: CorrelationRegistry,
    speech: Option<Arc<dyn SpeechResolver>>,
    timeout: Duration,
}

impl Voice {
    pub fn new(
        leg: LegId,
        channel: Arc<dyn CommandChannel>,
        registry: CorrelationRegistry,
    ) -> Self {
        Self {
            leg,
            channel,
            registry,
            speech: None,
            timeout: DEFAULT_VERB_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_speech(mut self, speech: Arc<dyn SpeechResolver>) -> Self {
        self.speech = Some(speech);
        self
    }

    pub fn leg(&self) -> &LegId {
        &self.leg
    }

    pub fn verb(&self, kind: VerbKind) -> Verb {
        Verb::new(self.leg.clone(), kind, self.channel.clone(), self.registry.clone())
            .with_timeout(self.timeout)
    }

    pub async fn answer(&self) -> Result<Event, VerbError> {
        self.verb(VerbKind::Answer).run().await
    }

    pub async fn hangup(&self) -> Result<Event, VerbError> {
        self.verb(VerbKind::Hangup).run().await
    }

    pub async fn play(&self, args: PlayCommand) -> Result<Event, VerbError> {
        self.verb(VerbKind::Play(args)).run().await
    }

    /// Synthesizes `text` (or reuses the cached file) and plays it.
    pub async fn say(&self, text: &str, options: &Value) -> Result<Event, VerbError> {
        let speech = self
            .speech
            .as_ref()
            .ok_or_else(|| VerbError::Media(anyhow::anyhow!("no speech resolver configured")))?;
        let path = speech.resolve(text, options).await.map_err(VerbError::Media)?;
        self.play(PlayCommand::new(&verb::media_uri(&path))).await
    }

    /// Returns the collected digits.
    pub async fn gather(&self, args: GatherCommand) -> Result<String, VerbError> {
        let event = self.verb(VerbKind::Gather(args)).run().await?;
        Ok(verb::digits(&event))
    }

    pub async fn dial(&self, args: DialCommand) -> Result<Event, VerbError> {
        self.verb(VerbKind::Dial(args)).run().await
    }

    pub async fn record(&self, args: RecordCommand) -> Result<Event, VerbError> {
        self.verb(VerbKind::Record(args)).run().await
    }
}
