use std::fmt;
use std::sync::Arc;

use crate::facet::{downcast_arc, Facet, FacetRef};

/// Immutable telemetry event: a short description plus ordered facets.
///
/// Nodes never mutate an event; each node builds a new one with its own
/// facets merged in. Cloning is cheap.
#[derive(Clone)]
pub struct Event {
    description: Arc<str>,
    facets: Arc<[FacetRef]>,
}

impl Event {
    pub fn new(description: impl Into<String>) -> Self {
        Self::with_facets(description, Vec::new())
    }

    pub fn with_facets(description: impl Into<String>, facets: Vec<FacetRef>) -> Self {
        let description: String = description.into();
        Self {
            description: Arc::from(description),
            facets: facets.into(),
        }
    }

    /// A copy of this event with `facet` appended.
    pub fn and(&self, facet: impl Facet) -> Self {
        let mut facets = self.facets.to_vec();
        facets.push(Arc::new(facet));
        Self {
            description: Arc::clone(&self.description),
            facets: facets.into(),
        }
    }

    /// Same description, different facets.
    pub(crate) fn rebuilt(&self, facets: Vec<FacetRef>) -> Self {
        Self {
            description: Arc::clone(&self.description),
            facets: facets.into(),
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn facets(&self) -> &[FacetRef] {
        &self.facets
    }

    /// Facets of concrete type `T`, in event order.
    pub fn facets_of<T: Facet>(&self) -> impl Iterator<Item = &T> + '_ {
        self.facets.iter().filter_map(|f| f.downcast_ref::<T>())
    }

    /// Shared handles to the facets of concrete type `T`, in event order.
    pub fn facet_handles_of<T: Facet>(&self) -> Vec<Arc<T>> {
        self.facets.iter().filter_map(downcast_arc::<T>).collect()
    }

    pub fn has_facet<T: Facet>(&self) -> bool {
        self.facets.iter().any(|f| f.is::<T>())
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("description", &self.description)
            .field("facets", &self.facets)
            .finish()
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description)?;
        for facet in self.facets.iter() {
            write!(f, "\n{:?}", facet)?;
        }
        Ok(())
    }
}
