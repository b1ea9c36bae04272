use async_trait::async_trait;
use courtbook_core::notify::{NotificationKind, Notifier};

/// Log-backed notification sink. Stands in for the external delivery
/// collaborator; records the request and always succeeds.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(
        &self,
        recipient: &str,
        kind: NotificationKind,
        payload: serde_json::Value,
    ) -> eyre::Result<()> {
        tracing::info!("notification requested: recipient={}, kind={}, payload={}", recipient, kind, payload);
        Ok(())
    }
}

/// Fire-and-forget dispatch: a failed notification is logged and
/// swallowed, never surfaced to the state change that triggered it.
pub async fn fire(
    notifier: &dyn Notifier,
    recipient: &str,
    kind: NotificationKind,
    payload: serde_json::Value,
) {
    if let Err(err) = notifier.notify(recipient, kind, payload).await {
        tracing::warn!("notification delivery failed: recipient={}, kind={}, error={}", recipient, kind, err);
    }
}
