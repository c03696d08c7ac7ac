use crate::domain::ColorHint;

/// Fire-and-forget user notification. Implementations must swallow their own
/// failures.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, message: &str, color: ColorHint);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl NotificationSink for TracingNotifier {
    fn notify(&self, message: &str, color: ColorHint) {
        tracing::info!(target: "notify", color = color.as_hex(), "{message}");
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SilentNotifier;

impl NotificationSink for SilentNotifier {
    fn notify(&self, _message: &str, _color: ColorHint) {}
}
