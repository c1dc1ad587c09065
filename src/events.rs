//! Platform event fan-out for SSE subscribers.
//!
//! Handlers publish small JSON notifications (`assessment.saved`,
//! `assessment.completed`, `report.generated`) and the SSE endpoint forwards
//! the ones matching its assessment id.

use serde_json::Value;
use tokio::sync::broadcast;

/// Broadcasts JSON notification strings to all SSE subscribers.
#[derive(Clone)]
pub struct EventBroadcaster {
    tx: broadcast::Sender<String>,
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBroadcaster {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(256);
        Self { tx }
    }

    /// Publish an event to all subscribers. No subscribers is fine.
    pub fn publish(&self, event: &str, params: Value) {
        let notification = serde_json::json!({
            "event": event,
            "params": params,
        });
        let _ = self
            .tx
            .send(serde_json::to_string(&notification).unwrap_or_default());
    }

    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscriber_receives_published_event() {
        let broadcaster = EventBroadcaster::new();
        let mut rx = broadcaster.subscribe();
        broadcaster.publish("assessment.saved", serde_json::json!({ "assessment_id": "a1" }));
        let raw = rx.recv().await.expect("event");
        let value: serde_json::Value = serde_json::from_str(&raw).expect("json");
        assert_eq!(value["event"], "assessment.saved");
        assert_eq!(value["params"]["assessment_id"], "a1");
    }

    #[test]
    fn publish_without_subscribers_is_silent() {
        let broadcaster = EventBroadcaster::new();
        broadcaster.publish("report.generated", serde_json::json!({}));
    }
}
