//! Logging shorthands on [`Telemeter`].
//!
//! Each call records one event tagged with a [`Significance`]; pair with a
//! [`LogRelay`](crate::relay::LogRelay) to see them.

use crate::event::Event;
use crate::facet::{facet, Failure, Significance};

use super::Telemeter;

impl Telemeter {
    /// Records `"{tag} - {message}"`, or just `message` without a tag.
    pub fn log(&self, tag: Option<&str>, message: &str, significance: Significance) {
        let description = match tag {
            Some(tag) => format!("{} - {}", tag, message),
            None => message.to_string(),
        };
        self.record(&Event::with_facets(description, vec![facet(significance)]));
    }

    /// Records `"{tag} {message} - {error}"`, leaving out absent parts. An
    /// error also adds a `Failure` facet with the same text.
    pub fn log_error(
        &self,
        tag: Option<&str>,
        message: &str,
        significance: Significance,
        error: Option<anyhow::Error>,
    ) {
        let mut description = match tag {
            Some(tag) => format!("{} {}", tag, message),
            None => message.to_string(),
        };
        if let Some(error) = &error {
            description.push_str(&format!(" - {}", error));
        }

        let mut facets = vec![facet(significance)];
        if let Some(error) = error {
            facets.push(facet(Failure::new(description.clone()).with_error(error)));
        }
        self.record(&Event::with_facets(description, facets));
    }

    pub fn verbose(&self, tag: Option<&str>, message: &str) {
        self.log(tag, message, Significance::Verbose);
    }

    pub fn debug(&self, tag: Option<&str>, message: &str) {
        self.log(tag, message, Significance::Debug);
    }

    pub fn info(&self, tag: Option<&str>, message: &str) {
        self.log(tag, message, Significance::Informational);
    }

    pub fn warn(&self, tag: Option<&str>, message: &str) {
        self.log(tag, message, Significance::Warning);
    }

    pub fn error(&self, tag: Option<&str>, message: &str, error: Option<anyhow::Error>) {
        self.log_error(tag, message, Significance::Error, error);
    }

    /// Something that should never happen.
    pub fn wtf(&self, tag: Option<&str>, message: &str, error: Option<anyhow::Error>) {
        self.log_error(tag, message, Significance::InternalError, error);
    }
}
