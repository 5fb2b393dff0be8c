//! Relay that renders events as human-readable log lines and emits them
//! through `tracing`.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::Relay;
use crate::event::Event;
use crate::facet::{Prefix, Significance};

pub const TAG: &str = "Telemetry";
const SEPARATOR: &str = " | ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogRelayConfig {
    /// Used for events that carry no `Significance` facet.
    pub default_significance: Significance,
    /// Less significant events are skipped.
    pub minimum_significance: Significance,
    /// Tag with every prefix and print every non-significance facet.
    pub detailed: bool,
}

impl Default for LogRelayConfig {
    fn default() -> Self {
        Self {
            default_significance: Significance::Debug,
            minimum_significance: Significance::Debug,
            detailed: false,
        }
    }
}

/// One rendered log line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub tag: String,
    pub significance: Significance,
    pub value: String,
}

pub type Sink = Arc<dyn Fn(&Message) + Send + Sync>;

pub struct LogRelay {
    config: LogRelayConfig,
    sink: Option<Sink>,
}

impl LogRelay {
    pub fn new(config: LogRelayConfig) -> Self {
        Self { config, sink: None }
    }

    /// Send rendered messages to `sink` instead of `tracing`.
    pub fn with_sink<F>(mut self, sink: F) -> Self
    where
        F: Fn(&Message) + Send + Sync + 'static,
    {
        self.sink = Some(Arc::new(sink));
        self
    }

    pub fn config(&self) -> &LogRelayConfig {
        &self.config
    }

    /// Highest attached significance, or the configured default.
    fn significance_of(&self, event: &Event) -> Significance {
        event
            .facets_of::<Significance>()
            .max()
            .copied()
            .unwrap_or(self.config.default_significance)
    }

    /// `None` when the event is below the minimum significance.
    pub fn render(&self, event: &Event) -> Option<Message> {
        let significance = self.significance_of(event);
        if significance < self.config.minimum_significance {
            return None;
        }

        let mut tag = format!("{}{}{}", TAG, SEPARATOR, significance);
        let value = if self.config.detailed {
            let prefixes: Vec<&str> = event.facets_of::<Prefix>().map(Prefix::value).collect();
            tag.push_str(SEPARATOR);
            tag.push_str(&prefixes.join(SEPARATOR));

            let mut value = event.description().to_string();
            for facet in event.facets().iter().filter(|f| !f.is::<Significance>()) {
                value.push('\n');
                value.push_str(&format!("{:?}", facet));
            }
            value
        } else {
            if let Some(local) = event.facets_of::<Prefix>().last() {
                tag.push_str(SEPARATOR);
                tag.push_str(local.value());
            }
            event.description().to_string()
        };

        Some(Message {
            tag,
            significance,
            value,
        })
    }
}

impl Default for LogRelay {
    fn default() -> Self {
        Self::new(LogRelayConfig::default())
    }
}

impl fmt::Debug for LogRelay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogRelay")
            .field("config", &self.config)
            .field("sink", &self.sink.is_some())
            .finish()
    }
}

fn emit(message: &Message) {
    let Message {
        tag,
        significance,
        value,
    } = message;
    match significance {
        Significance::Verbose => tracing::trace!(target: "telemeter", tag = %tag, "{}", value),
        Significance::Debug => tracing::debug!(target: "telemeter", tag = %tag, "{}", value),
        Significance::Informational => tracing::info!(target: "telemeter", tag = %tag, "{}", value),
        Significance::Warning => tracing::warn!(target: "telemeter", tag = %tag, "{}", value),
        Significance::Error | Significance::InternalError => {
            tracing::error!(target: "telemeter", tag = %tag, "{}", value)
        }
    }
}

#[async_trait]
impl Relay for LogRelay {
    fn name(&self) -> &str {
        "log"
    }

    async fn process(&self, event: &Event) -> anyhow::Result<()> {
        let Some(message) = self.render(event) else {
            return Ok(());
        };
        match &self.sink {
            Some(sink) => sink(&message),
            None => emit(&message),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn event() -> Event {
        Event::new("cart opened")
            .and(Prefix::app("shop"))
            .and(Prefix::screen("cart"))
            .and(Significance::Informational)
    }

    #[test]
    fn test_simple_tag_uses_most_local_prefix() {
        let message = LogRelay::default().render(&event()).unwrap();
        assert_eq!(message.tag, "Telemetry | INFORMATIONAL | cart");
        assert_eq!(message.value, "cart opened");
        assert_eq!(message.significance, Significance::Informational);
    }

    #[test]
    fn test_detailed_tag_and_value() {
        let relay = LogRelay::new(LogRelayConfig {
            detailed: true,
            ..LogRelayConfig::default()
        });
        let message = relay.render(&event()).unwrap();
        assert_eq!(message.tag, "Telemetry | INFORMATIONAL | shop | cart");
        assert_eq!(
            message.value,
            "cart opened\nApp(\"shop\")\nScreen(\"cart\")"
        );
    }

    #[test]
    fn test_highest_significance_wins() {
        let e = Event::new("x")
            .and(Significance::Warning)
            .and(Significance::Verbose);
        let message = LogRelay::default().render(&e).unwrap();
        assert_eq!(message.significance, Significance::Warning);
        assert_eq!(message.tag, "Telemetry | WARNING");
    }

    #[test]
    fn test_below_minimum_is_skipped() {
        let relay = LogRelay::new(LogRelayConfig {
            minimum_significance: Significance::Warning,
            ..LogRelayConfig::default()
        });
        assert!(relay.render(&event()).is_none());
        // No significance falls back to the default, DEBUG.
        assert!(relay.render(&Event::new("bare")).is_none());
    }

    #[tokio::test]
    async fn test_sink_receives_rendered_message() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let relay = LogRelay::default().with_sink(move |m| sink.lock().unwrap().push(m.clone()));

        relay.process(&event()).await.unwrap();
        relay.process(&Event::new("no facets")).await.unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[1].tag, "Telemetry | DEBUG");
        assert_eq!(seen[1].value, "no facets");
    }
}
