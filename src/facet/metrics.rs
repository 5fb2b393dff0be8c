use serde_json::{Map, Value};

use super::{Computed, Facet};

pub type MetricParams = Map<String, Value>;

/// Named analytics event with parameters computed when a relay asks for them.
#[derive(Debug, Clone)]
pub struct DeveloperMetrics {
    event_name: String,
    params: Computed<Option<MetricParams>>,
}

impl DeveloperMetrics {
    pub fn new(event_name: impl Into<String>) -> Self {
        Self {
            event_name: event_name.into(),
            params: Computed::new(|| None),
        }
    }

    pub fn with_params<F>(mut self, params: F) -> Self
    where
        F: Fn() -> Option<MetricParams> + Send + Sync + 'static,
    {
        self.params = Computed::new(params);
        self
    }

    pub fn event_name(&self) -> &str {
        &self.event_name
    }

    pub fn params(&self) -> Option<MetricParams> {
        self.params.compute()
    }
}

impl Facet for DeveloperMetrics {}
