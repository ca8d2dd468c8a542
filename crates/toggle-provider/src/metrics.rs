//! Usage counters reported back to the flag backend.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::Serialize;

/// How often a feature resolved to enabled (`yes`) or disabled (`no`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ToggleCount {
    pub yes: u64,
    pub no: u64,
}

/// Counts gathered between `start` and `stop`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsBucket {
    pub start: DateTime<Utc>,
    pub stop: DateTime<Utc>,
    pub toggles: BTreeMap<String, ToggleCount>,
}

impl ToggleCount {
    fn bump(&mut self, enabled: bool) {
        if enabled {
            self.yes += 1;
        } else {
            self.no += 1;
        }
    }
}

impl MetricsBucket {
    pub fn is_empty(&self) -> bool {
        self.toggles.is_empty()
    }
}

/// Body of `POST /client/metrics`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsReport {
    pub app_name: String,
    pub instance_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
    pub bucket: MetricsBucket,
}

/// Running counters for the current bucket.
#[derive(Debug)]
pub(crate) struct UsageCounters {
    start: DateTime<Utc>,
    toggles: HashMap<String, ToggleCount>,
}

impl UsageCounters {
    pub(crate) fn new() -> Self {
        Self {
            start: Utc::now(),
            toggles: HashMap::new(),
        }
    }

    pub(crate) fn record(&mut self, name: &str, enabled: bool) {
        if let Some(count) = self.toggles.get_mut(name) {
            count.bump(enabled);
            return;
        }
        self.toggles
            .entry(name.to_owned())
            .or_default()
            .bump(enabled);
    }

    /// Close the current bucket and start a new one.
    pub(crate) fn drain(&mut self) -> MetricsBucket {
        let stop = Utc::now();
        let start = std::mem::replace(&mut self.start, stop);
        MetricsBucket {
            start,
            stop,
            toggles: self.toggles.drain().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_and_drain() {
        let mut counters = UsageCounters::new();
        counters.record("a", true);
        counters.record("a", true);
        counters.record("a", false);
        counters.record("b", false);

        let bucket = counters.drain();
        assert_eq!(bucket.toggles["a"], ToggleCount { yes: 2, no: 1 });
        assert_eq!(bucket.toggles["b"], ToggleCount { yes: 0, no: 1 });
        assert!(bucket.start <= bucket.stop);

        let next = counters.drain();
        assert!(next.is_empty());
        assert_eq!(next.start, bucket.stop);
    }

    #[test]
    fn report_serializes_in_backend_shape() {
        let mut counters = UsageCounters::new();
        counters.record("f1", true);
        let report = MetricsReport {
            app_name: "app".into(),
            instance_id: "app-1".into(),
            environment: None,
            bucket: counters.drain(),
        };

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["appName"], "app");
        assert_eq!(value["instanceId"], "app-1");
        assert!(value.get("environment").is_none());
        assert_eq!(value["bucket"]["toggles"]["f1"]["yes"], 1);
        assert!(value["bucket"]["start"].is_string());
    }
}
