//! Best-effort publishing of domain events to a message queue.

use async_trait::async_trait;

/// The body written to the queue: `{name, data}`.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct QueueMessage {
    name: String,
    data: serde_json::Value,
}

impl QueueMessage {
    pub fn new(name: &str, data: serde_json::Value) -> Self {
        Self {
            name: name.to_string(),
            data,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> &serde_json::Value {
        &self.data
    }
}

/// A connection to a broker able to put a message on a named queue.
#[async_trait]
pub trait QueueChannel: Send + Sync {
    async fn send_to_queue(&self, queue: &str, message: QueueMessage) -> anyhow::Result<()>;
}

#[async_trait]
impl QueueChannel for tokio::sync::mpsc::Sender<(String, QueueMessage)> {
    async fn send_to_queue(&self, queue: &str, message: QueueMessage) -> anyhow::Result<()> {
        self.send((queue.to_string(), message))
            .await
            .map_err(|_| anyhow::anyhow!("queue channel closed"))
    }
}

/// Publishes events to one queue.
pub struct EventsSender<C> {
    channel: C,
    queue: String,
}

impl<C: QueueChannel> EventsSender<C> {
    pub fn new(channel: C, queue: &str) -> Self {
        Self {
            channel,
            queue: queue.to_string(),
        }
    }

    pub fn queue(&self) -> &str {
        &self.queue
    }

    pub async fn send_to_q(&self, event: &str, payload: serde_json::Value) -> anyhow::Result<()> {
        tracing::debug!(
            "sent event to q => {}, event: {}, payload: {}",
            self.queue,
            event,
            payload
        );
        self.channel
            .send_to_queue(&self.queue, QueueMessage::new(event, payload))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_send_to_q_wraps_name_and_data() {
        let (tx, mut rx) = tokio::sync::mpsc::channel::<(String, QueueMessage)>(4);
        let sender = EventsSender::new(tx, "call-manager");

        sender
            .send_to_q("call-started", json!({"legId": "leg-1", "number": "17853178070"}))
            .await
            .unwrap();

        let (queue, message) = rx.recv().await.unwrap();
        assert_eq!(queue, "call-manager");
        assert_eq!(message.name(), "call-started");
        assert_eq!(
            serde_json::to_value(&message).unwrap(),
            json!({"name": "call-started", "data": {"legId": "leg-1", "number": "17853178070"}})
        );
    }

    #[tokio::test]
    async fn test_send_to_closed_queue_fails() {
        let (tx, rx) = tokio::sync::mpsc::channel::<(String, QueueMessage)>(1);
        drop(rx);
        let sender = EventsSender::new(tx, "call-manager");
        assert!(sender.send_to_q("call-ended", json!(null)).await.is_err());
    }
}
