use serde::{Serialize, Deserialize};
use serde_json::{Map, Value};

// Allowed: action names, page/zone/component labels, counts, durations.
// Forbidden: user identifiers of any kind. Identity travels as a transport credential.

/// An event as the UI hands it over, before it is stamped.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EventDraft {
    pub action: String,
    pub page: String,
    pub zone: Option<String>,
    pub component: Option<String>,
    pub metadata: Option<Map<String, Value>>,
}

impl EventDraft {
    pub fn new(action: impl Into<String>, page: impl Into<String>) -> Self {
        Self { action: action.into(), page: page.into(), ..Default::default() }
    }

    pub fn zone(mut self, zone: impl Into<String>) -> Self {
        self.zone = Some(zone.into());
        self
    }

    pub fn component(mut self, component: impl Into<String>) -> Self {
        self.component = Some(component.into());
        self
    }

    pub fn meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.get_or_insert_with(Map::new).insert(key.into(), value.into());
        self
    }

    /// Dwell-time event for a zone, as produced from a stopped timer.
    pub fn dwell(page: impl Into<String>, zone: impl Into<String>, seconds: u64) -> Self {
        Self::new("zone_dwell", page).zone(zone).meta("duration", seconds)
    }

    pub(crate) fn stamp(self, ts: u64) -> AnalyticsEvent {
        AnalyticsEvent {
            action: self.action,
            page: self.page,
            zone: self.zone,
            component: self.component,
            metadata: self.metadata,
            ts,
        }
    }
}

/// Wire shape of one event. `ts` is unix seconds at enqueue time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsEvent {
    pub action: String,
    pub page: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
    pub ts: u64,
}

/// Ingestion request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchPayload {
    pub session_id: String,
    pub events: Vec<AnalyticsEvent>,
}

/// Ingestion success body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestResponse {
    pub message: String,
    pub count: usize,
}
