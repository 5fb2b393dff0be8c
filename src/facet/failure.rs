use std::sync::Arc;

use uuid::Uuid;

use super::Facet;

/// Where a [`Failure`] facet came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureOrigin {
    /// Attached by application code, e.g. through `Telemeter::error`.
    Application,
    /// Produced by the pipeline after a relay returned an error or panicked.
    /// `node` is the id of the telemeter node that owns the relay.
    Relay {
        relay: String,
        node: Uuid,
        correlation: Uuid,
    },
}

/// A message and, optionally, the error behind it.
#[derive(Debug, Clone)]
pub struct Failure {
    message: String,
    error: Option<Arc<anyhow::Error>>,
    origin: FailureOrigin,
}

impl Failure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            error: None,
            origin: FailureOrigin::Application,
        }
    }

    pub fn with_error(mut self, error: anyhow::Error) -> Self {
        self.error = Some(Arc::new(error));
        self
    }

    /// Failure raised by a relay of node `node` while it processed an event.
    pub fn from_relay(relay: &str, node: Uuid, error: anyhow::Error) -> Self {
        Self {
            message: format!("relay `{}` failed while processing an event: {:#}", relay, error),
            error: Some(Arc::new(error)),
            origin: FailureOrigin::Relay {
                relay: relay.to_string(),
                node,
                correlation: Uuid::new_v4(),
            },
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn error(&self) -> Option<&anyhow::Error> {
        self.error.as_deref()
    }

    pub fn origin(&self) -> &FailureOrigin {
        &self.origin
    }

    /// True for failures the pipeline produced from a relay error.
    pub fn is_relay_failure(&self) -> bool {
        matches!(self.origin, FailureOrigin::Relay { .. })
    }

    /// True for failures the pipeline produced from a relay owned by `node`.
    pub fn is_relay_failure_at(&self, node: Uuid) -> bool {
        matches!(self.origin, FailureOrigin::Relay { node: owner, .. } if owner == node)
    }
}

/// Structural equality: same message, same error instance, same origin.
impl PartialEq for Failure {
    fn eq(&self, other: &Self) -> bool {
        let same_error = match (&self.error, &other.error) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };
        self.message == other.message && same_error && self.origin == other.origin
    }
}

impl Facet for Failure {}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn test_application_failure() {
        let failure = Failure::new("checkout broke").with_error(anyhow!("timeout"));
        assert_eq!(failure.message(), "checkout broke");
        assert_eq!(failure.error().unwrap().to_string(), "timeout");
        assert!(!failure.is_relay_failure());
        assert!(!failure.is_relay_failure_at(Uuid::new_v4()));
    }

    #[test]
    fn test_relay_failure_names_relay_and_error() {
        let node = Uuid::new_v4();
        let failure = Failure::from_relay("analytics", node, anyhow!("quota exceeded"));
        assert!(failure.is_relay_failure());
        assert!(failure.message().contains("analytics"));
        assert!(failure.message().contains("quota exceeded"));
        match failure.origin() {
            FailureOrigin::Relay { relay, node: owner, .. } => {
                assert_eq!(relay, "analytics");
                assert_eq!(*owner, node);
            }
            other => panic!("unexpected origin {:?}", other),
        }
        assert!(failure.is_relay_failure_at(node));
        assert!(!failure.is_relay_failure_at(Uuid::new_v4()));
    }

    #[test]
    fn test_structural_equality() {
        let a = Failure::new("same").with_error(anyhow!("boom"));
        let b = a.clone();
        assert_eq!(a, b);

        // Equal text, different error instance.
        let c = Failure::new("same").with_error(anyhow!("boom"));
        assert_ne!(a, c);

        assert_eq!(Failure::new("x"), Failure::new("x"));
    }

    #[test]
    fn test_relay_failures_get_distinct_correlations() {
        let node = Uuid::new_v4();
        let a = Failure::from_relay("r", node, anyhow!("e"));
        let b = Failure::from_relay("r", node, anyhow!("e"));
        assert_ne!(a.origin(), b.origin());
    }
}
