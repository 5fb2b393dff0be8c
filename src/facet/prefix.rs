use serde::{Deserialize, Serialize};

use super::Facet;

/// Scope label. Attach one to each node of a telemeter tree and events pick
/// up the full trail, outermost scope first.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "scope", content = "value")]
pub enum Prefix {
    App(String),
    Module(String),
    Screen(String),
    Class(String),
    LocalScope(String),
}

impl Prefix {
    pub fn value(&self) -> &str {
        match self {
            Prefix::App(v)
            | Prefix::Module(v)
            | Prefix::Screen(v)
            | Prefix::Class(v)
            | Prefix::LocalScope(v) => v,
        }
    }

    pub fn app(value: impl Into<String>) -> Self {
        Prefix::App(value.into())
    }

    pub fn module(value: impl Into<String>) -> Self {
        Prefix::Module(value.into())
    }

    pub fn screen(value: impl Into<String>) -> Self {
        Prefix::Screen(value.into())
    }

    pub fn class(value: impl Into<String>) -> Self {
        Prefix::Class(value.into())
    }

    pub fn local_scope(value: impl Into<String>) -> Self {
        Prefix::LocalScope(value.into())
    }
}

impl Facet for Prefix {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_for_every_scope() {
        let prefixes = [
            Prefix::app("a"),
            Prefix::module("m"),
            Prefix::screen("s"),
            Prefix::class("c"),
            Prefix::local_scope("l"),
        ];
        let values: Vec<&str> = prefixes.iter().map(Prefix::value).collect();
        assert_eq!(values, vec!["a", "m", "s", "c", "l"]);
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(Prefix::module("checkout")).unwrap();
        assert_eq!(json["scope"], "Module");
        assert_eq!(json["value"], "checkout");
    }
}
