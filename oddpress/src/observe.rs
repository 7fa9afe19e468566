use std::collections::HashMap;
use std::sync::Mutex;
use tracing::info;

/// Receives run-level events from the pipeline (collection totals, selection phases,
/// summary fallbacks, page writes).
pub trait RunObserver: Send + Sync {
    fn event(&self, event: &str, fields: &[(&str, String)]);
}

/// Forwards every event to `tracing` at info level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl RunObserver for TracingObserver {
    fn event(&self, event: &str, fields: &[(&str, String)]) {
        let rendered = fields
            .iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect::<Vec<_>>()
            .join(" ");
        info!(event = event, "{}", rendered);
    }
}

/// Keeps events in memory so tests can assert on them.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<(String, HashMap<String, String>)>>,
}

impl RecordingObserver {
    pub fn events(&self) -> Vec<(String, HashMap<String, String>)> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn events_named(&self, name: &str) -> Vec<HashMap<String, String>> {
        self.events()
            .into_iter()
            .filter(|(event, _)| event == name)
            .map(|(_, fields)| fields)
            .collect()
    }

    pub fn has_event(&self, name: &str) -> bool {
        !self.events_named(name).is_empty()
    }
}

impl RunObserver for RecordingObserver {
    fn event(&self, event: &str, fields: &[(&str, String)]) {
        let fields = fields
            .iter()
            .map(|(key, value)| (key.to_string(), value.clone()))
            .collect();
        if let Ok(mut events) = self.events.lock() {
            events.push((event.to_string(), fields));
        }
    }
}
