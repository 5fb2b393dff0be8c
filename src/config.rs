//! Flow configuration for a telemeter node's broadcast buffer.
//!
//! Loaded from defaults, an optional config file (TOML, JSON, YAML) and
//! `TELEMETER__*` environment variables.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;

use crate::error::{Result, TelemetryError};

/// What a node does when a relay's unread backlog reaches buffer capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OverflowPolicy {
    /// Discard the slow relay's oldest unread event. The producer never waits.
    DropOldest,
    /// Hold new events back until every relay has room for them.
    Suspend,
}

/// Backpressure and execution settings shared by a node and, unless
/// overridden, all of its children.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowConfig {
    /// Most recent events handed to a relay that subscribes late.
    pub replay: usize,
    /// Unread slots per relay beyond `replay`.
    pub extra_buffer_capacity: usize,
    pub overflow: OverflowPolicy,
    /// Attach a `ThreadData` facet describing the recording call site.
    pub propagate_thread_data: bool,
    /// Runtime that hosts relay tasks. Falls back to the ambient runtime.
    #[serde(skip)]
    pub runtime: Option<Handle>,
    /// External scope. Cancelling it stops relay work of every node built
    /// with this config.
    #[serde(skip)]
    pub scope: Option<CancellationToken>,
}

impl FlowConfig {
    /// Lossy default: a stalled relay falls behind and loses its oldest
    /// events instead of stalling the rest of the pipeline.
    pub fn telemetry_default() -> Self {
        Self {
            replay: 64,
            extra_buffer_capacity: 64,
            overflow: OverflowPolicy::DropOldest,
            propagate_thread_data: false,
            runtime: None,
            scope: None,
        }
    }

    /// Every relay eventually sees every event, at the cost of delaying
    /// delivery behind the slowest relay.
    pub fn lossless() -> Self {
        Self {
            replay: 0,
            extra_buffer_capacity: 0,
            overflow: OverflowPolicy::Suspend,
            propagate_thread_data: false,
            runtime: None,
            scope: None,
        }
    }

    pub fn with_thread_data(mut self, enabled: bool) -> Self {
        self.propagate_thread_data = enabled;
        self
    }

    pub fn with_runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    pub fn with_scope(mut self, scope: CancellationToken) -> Self {
        self.scope = Some(scope);
        self
    }

    pub fn capacity(&self) -> usize {
        self.replay.saturating_add(self.extra_buffer_capacity)
    }

    pub fn validate(&self) -> Result<()> {
        if self.overflow == OverflowPolicy::DropOldest && self.capacity() == 0 {
            return Err(TelemetryError::invalid_config(
                "DROP_OLDEST needs replay + extra_buffer_capacity > 0",
            ));
        }
        Ok(())
    }
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self::telemetry_default()
    }
}

/// Load a flow configuration from a file, layered with `TELEMETER__*`
/// environment variables.
pub fn load_flow_config<P: AsRef<Path>>(path: P) -> Result<FlowConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(TelemetryError::invalid_config(format!(
            "config file not found: {}",
            path.display()
        )));
    }

    let settings = config::Config::builder()
        .add_source(config::File::from(path))
        .add_source(
            config::Environment::with_prefix("TELEMETER")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let flow: FlowConfig = settings.try_deserialize()?;
    flow.validate()?;

    tracing::debug!(path = %path.display(), overflow = ?flow.overflow, "flow config loaded");

    Ok(flow)
}

pub fn load_flow_config_or_default<P: AsRef<Path>>(path: P) -> FlowConfig {
    match load_flow_config(path) {
        Ok(flow) => flow,
        Err(e) => {
            tracing::warn!("failed to load flow config, using defaults: {}", e);
            FlowConfig::default()
        }
    }
}
