use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::error::TransportError;
use crate::types::{Command, CommandEnvelope, LegId};

/// The outbound, fire-and-forget half of the media server connection.
///
/// A successful `post` only means the command was handed to the transport.
/// Whether the media server acted on it is learned from the event stream.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait CommandChannel: Send + Sync {
    async fn post(&self, leg: &LegId, command: Command) -> Result<(), TransportError>;
}

#[async_trait]
impl CommandChannel for tokio::sync::mpsc::Sender<CommandEnvelope> {
    async fn post(&self, leg: &LegId, command: Command) -> Result<(), TransportError> {
        self.send(CommandEnvelope::new(leg.clone(), command))
            .await
            .map_err(|_| TransportError::Closed)
    }
}

#[cfg(test)]
pub(crate) mod fake {
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    use super::*;
    use crate::bus::EventBus;
    use crate::lock;
    use crate::types::Event;

    /// Answers posted commands by publishing a canned event after a delay.
    pub(crate) struct FakeMediaServer {
        bus: EventBus,
        delay: Duration,
        replies: HashMap<&'static str, (&'static str, serde_json::Value)>,
        posted: Mutex<Vec<CommandEnvelope>>,
    }

    impl FakeMediaServer {
        pub(crate) fn new(bus: EventBus) -> Self {
            Self {
                bus,
                delay: Duration::from_millis(10),
                replies: HashMap::new(),
                posted: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        pub(crate) fn reply(
            mut self,
            verb: &'static str,
            event_type: &'static str,
            data: serde_json::Value,
        ) -> Self {
            self.replies.insert(verb, (event_type, data));
            self
        }

        pub(crate) fn posted(&self) -> Vec<CommandEnvelope> {
            lock(&self.posted).clone()
        }
    }

    #[async_trait]
    impl CommandChannel for FakeMediaServer {
        async fn post(&self, leg: &LegId, command: Command) -> Result<(), TransportError> {
            let reply = self.replies.get(command.verb()).cloned();
            lock(&self.posted).push(CommandEnvelope::new(leg.clone(), command));
            if let Some((event_type, data)) = reply {
                let bus = self.bus.clone();
                let event = Event::new(leg.clone(), event_type, data);
                let delay = self.delay;
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    bus.publish(&event);
                });
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::commands::PlayCommand;

    #[tokio::test]
    async fn test_mpsc_sender_posts_envelope() {
        let (tx, mut rx) = tokio::sync::mpsc::channel::<CommandEnvelope>(4);
        let leg = LegId::new("leg-1");
        tx.post(&leg, Command::Play(PlayCommand::new("sound:hello-world")))
            .await
            .unwrap();

        let envelope = rx.recv().await.unwrap();
        assert_eq!(envelope.leg_id(), &leg);
        assert_eq!(envelope.command().verb(), "play");
    }

    #[tokio::test]
    async fn test_mpsc_sender_reports_closed_channel() {
        let (tx, rx) = tokio::sync::mpsc::channel::<CommandEnvelope>(1);
        drop(rx);
        let err = tx.post(&LegId::new("leg-1"), Command::Hangup).await.unwrap_err();
        assert!(matches!(err, TransportError::Closed));
    }
}
