use chrono::Utc;

/// Appends a timestamped line to the per-run diagnostic log that is
/// returned alongside the answer.
pub fn log_step(logs: &mut Vec<String>, message: impl AsRef<str>) {
    let timestamp = Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
    logs.push(format!("[{timestamp}] {}", message.as_ref()));
}
