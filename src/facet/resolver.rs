//! Turning unresolved facets into concrete ones before delivery.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use tracing::warn;

use super::{Facet, FacetRef};

/// Maps one unresolved facet of a specific concrete type to zero or more
/// facets. Errors and panics are tolerated: the unresolved facet is then
/// delivered as-is.
pub trait FacetResolver: Send + Sync {
    /// Concrete type this resolver handles.
    fn key_type(&self) -> TypeId;

    fn resolve(&self, unresolved: &FacetRef) -> anyhow::Result<Vec<FacetRef>>;
}

/// Closure-backed resolver for unresolved facets of type `U`.
pub struct TypedResolver<U, F> {
    resolve: F,
    _unresolved: PhantomData<fn() -> U>,
}

pub fn resolver_fn<U, F>(resolve: F) -> TypedResolver<U, F>
where
    U: Facet,
    F: Fn(&U) -> anyhow::Result<Vec<FacetRef>> + Send + Sync,
{
    TypedResolver {
        resolve,
        _unresolved: PhantomData,
    }
}

impl<U, F> FacetResolver for TypedResolver<U, F>
where
    U: Facet,
    F: Fn(&U) -> anyhow::Result<Vec<FacetRef>> + Send + Sync,
{
    fn key_type(&self) -> TypeId {
        TypeId::of::<U>()
    }

    fn resolve(&self, unresolved: &FacetRef) -> anyhow::Result<Vec<FacetRef>> {
        match unresolved.downcast_ref::<U>() {
            Some(facet) => (self.resolve)(facet),
            None => Ok(vec![Arc::clone(unresolved)]),
        }
    }
}

/// Resolvers of one node, keyed by the concrete type they resolve.
#[derive(Clone, Default)]
pub struct Resolvers {
    by_type: HashMap<TypeId, Arc<dyn FacetResolver>>,
}

impl Resolvers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<R: FacetResolver + 'static>(mut self, resolver: R) -> Self {
        self.insert(Arc::new(resolver));
        self
    }

    /// Registers `resolver`, replacing any previous one for the same type.
    pub fn insert(&mut self, resolver: Arc<dyn FacetResolver>) {
        self.by_type.insert(resolver.key_type(), resolver);
    }

    pub fn get(&self, key: TypeId) -> Option<&Arc<dyn FacetResolver>> {
        self.by_type.get(&key)
    }

    pub fn len(&self) -> usize {
        self.by_type.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_type.is_empty()
    }
}

impl FromIterator<Arc<dyn FacetResolver>> for Resolvers {
    fn from_iter<I: IntoIterator<Item = Arc<dyn FacetResolver>>>(iter: I) -> Self {
        let mut resolvers = Resolvers::new();
        for resolver in iter {
            resolvers.insert(resolver);
        }
        resolvers
    }
}

impl std::fmt::Debug for Resolvers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolvers").field("len", &self.len()).finish()
    }
}

/// Resolve every unresolved facet in `facets` with `resolvers`.
///
/// Output is the resolution results in the order their unresolved sources
/// appeared, followed by the facets that were already resolved. With no
/// resolvers the list comes back unchanged.
pub fn resolve_facets(facets: &[FacetRef], resolvers: &Resolvers) -> Vec<FacetRef> {
    if resolvers.is_empty() {
        return facets.to_vec();
    }

    let (unresolved, resolved): (Vec<&FacetRef>, Vec<&FacetRef>) =
        facets.iter().partition(|facet| facet.is_unresolved());

    let mut out = Vec::with_capacity(facets.len());
    for facet in unresolved {
        match resolvers.get(facet.facet_type_id()) {
            Some(resolver) => out.extend(resolve_one(resolver.as_ref(), facet)),
            None => out.push(Arc::clone(facet)),
        }
    }
    out.extend(resolved.into_iter().cloned());
    out
}

fn resolve_one(resolver: &dyn FacetResolver, facet: &FacetRef) -> Vec<FacetRef> {
    match catch_unwind(AssertUnwindSafe(|| resolver.resolve(facet))) {
        Ok(Ok(facets)) => facets,
        Ok(Err(e)) => {
            warn!(facet = ?facet, error = %e, "facet resolver failed; keeping unresolved facet");
            vec![Arc::clone(facet)]
        }
        Err(panic) => {
            warn!(
                facet = ?facet,
                panic = panic_message(panic.as_ref()),
                "facet resolver panicked; keeping unresolved facet"
            );
            vec![Arc::clone(facet)]
        }
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}
