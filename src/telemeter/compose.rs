use std::sync::Arc;

use crate::facet::{FacetRef, ThreadData};

/// Merged facet list for one node: `own`, then a fresh `ThreadData` when
/// enabled and `incoming` has none yet, then `incoming`.
///
/// Pure: inputs are left untouched, so ancestors can run the same merge on
/// the result and prepend their own facets.
pub fn compose(own: &[FacetRef], incoming: Vec<FacetRef>, propagate_thread_data: bool) -> Vec<FacetRef> {
    let thread_data = (propagate_thread_data && !incoming.iter().any(|f| f.is::<ThreadData>()))
        .then(|| Arc::new(ThreadData::capture()) as FacetRef);

    let mut merged = Vec::with_capacity(own.len() + incoming.len() + 1);
    merged.extend(own.iter().cloned());
    merged.extend(thread_data);
    merged.extend(incoming);
    merged
}
