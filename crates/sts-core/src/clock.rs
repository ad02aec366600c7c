use std::sync::Arc;

/// Source of "now" in milliseconds since the Unix epoch.
///
/// Injected wherever timestamps are stamped or compared so tests can pin time.
pub type Clock = Arc<dyn Fn() -> i64 + Send + Sync>;

/// Wall-clock time.
pub fn system_clock() -> Clock {
    Arc::new(|| chrono::Utc::now().timestamp_millis())
}
