use std::fmt;

use serde::{Deserialize, Serialize};

use super::Facet;

/// Severity of an event. Ordered from least to most significant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Significance {
    Verbose,
    Debug,
    Informational,
    Warning,
    Error,
    InternalError,
}

impl Significance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Significance::Verbose => "VERBOSE",
            Significance::Debug => "DEBUG",
            Significance::Informational => "INFORMATIONAL",
            Significance::Warning => "WARNING",
            Significance::Error => "ERROR",
            Significance::InternalError => "INTERNAL_ERROR",
        }
    }
}

impl fmt::Display for Significance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Facet for Significance {}
