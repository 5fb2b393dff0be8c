//! Facets: typed metadata attached to events.
//!
//! Any `Send + Sync + Debug + 'static` type becomes a facet with an empty
//! `impl Facet for T {}`. Relays find the ones they care about by downcasting,
//! see [`Event::facets_of`](crate::event::Event::facets_of).
//!
//! Facets that are expensive to build should be [`Computed`] or [`Lazy`] so
//! the work happens inside a relay task rather than on the recording thread.

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

pub mod computed;
pub mod failure;
pub mod metrics;
pub mod prefix;
pub mod resolver;
pub mod significance;
pub mod thread_data;

pub use computed::{Computed, Lazy};
pub use failure::{Failure, FailureOrigin};
pub use metrics::DeveloperMetrics;
pub use prefix::Prefix;
pub use resolver::{resolve_facets, resolver_fn, FacetResolver, Resolvers, TypedResolver};
pub use significance::Significance;
pub use thread_data::ThreadData;

/// Shared, immutable handle to a facet. Events hold these so copying an
/// event between nodes never copies facet payloads.
pub type FacetRef = Arc<dyn Facet>;

/// Upcasting support for facets. Implemented for every eligible type.
pub trait AsAny: Any + Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<T: Any + Send + Sync> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

pub trait Facet: AsAny + fmt::Debug {
    /// Unresolved facets are offered to the resolver registered for their
    /// concrete type at every node they pass through.
    fn is_unresolved(&self) -> bool {
        false
    }
}

impl dyn Facet {
    pub fn is<T: Facet>(&self) -> bool {
        self.as_any().is::<T>()
    }

    pub fn downcast_ref<T: Facet>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// `TypeId` of the concrete facet behind the trait object.
    pub fn facet_type_id(&self) -> TypeId {
        self.as_any().type_id()
    }
}

pub fn facet<F: Facet>(facet: F) -> FacetRef {
    Arc::new(facet)
}

/// Clone a facet handle as its concrete type, if it is one.
pub fn downcast_arc<T: Facet>(facet: &FacetRef) -> Option<Arc<T>> {
    if !facet.is::<T>() {
        return None;
    }
    Arc::clone(facet).into_any_arc().downcast::<T>().ok()
}
