//! Telemeter nodes.
//!
//! A node resolves the facets of each recorded event, prepends its own
//! facets, publishes the result to its relays and forwards it to its parent.
//! Children are created with [`Telemeter::child`]; a relay therefore sees
//! everything recorded at its node or below, with the full scope trail.
//!
//! # Execution
//! `record` never waits for relays. Resolution and merging for the whole
//! ancestor chain run on the caller; relay work runs in one task per relay
//! on the configured tokio runtime.

use std::fmt;
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use uuid::Uuid;

use crate::broadcast::{Broadcast, BroadcastSnapshot};
use crate::config::FlowConfig;
use crate::error::{Result, TelemetryError};
use crate::event::Event;
use crate::facet::{resolve_facets, Facet, FacetRef, FacetResolver, Resolvers};
use crate::relay::{Relay, RelayRef};

pub mod compose;
mod containment;
pub mod log;

pub use compose::compose;

/// Handle to a node of a telemetry tree. Cheap to clone.
///
/// Relay tasks stop when the last handle to their node is dropped or when
/// [`shutdown`](Self::shutdown) is called. A child keeps its parent alive.
#[derive(Clone)]
pub struct Telemeter {
    node: Arc<Node>,
}

pub(crate) struct Node {
    id: Uuid,
    facets: Vec<FacetRef>,
    resolvers: Resolvers,
    parent: Option<Telemeter>,
    flow: FlowConfig,
    runtime: Handle,
    events: Broadcast<Event>,
    relay_names: Vec<String>,
    scope: CancellationToken,
}

impl Drop for Node {
    fn drop(&mut self) {
        self.scope.cancel();
        self.events.close();
    }
}

impl Telemeter {
    pub fn builder() -> TelemeterBuilder {
        TelemeterBuilder::default()
    }

    /// Build a root node.
    ///
    /// Relay tasks run on `flow.runtime`, or on the runtime this is called
    /// from. Fails with [`TelemetryError::NoRuntime`] when there is neither.
    pub fn build(
        relays: Vec<RelayRef>,
        facets: Vec<FacetRef>,
        resolvers: Resolvers,
        flow: FlowConfig,
    ) -> Result<Self> {
        flow.validate()?;
        let runtime = match &flow.runtime {
            Some(handle) => handle.clone(),
            None => Handle::try_current().map_err(|_| TelemetryError::NoRuntime)?,
        };

        let telemeter = Self::spawn(relays, facets, resolvers, None, flow, runtime);
        debug!(
            relays = ?telemeter.node.relay_names,
            facets = telemeter.node.facets.len(),
            overflow = ?telemeter.node.flow.overflow,
            "telemeter built"
        );
        Ok(telemeter)
    }

    /// New node below this one with exactly the given relays, facets and
    /// resolvers. Flow settings and runtime are inherited.
    pub fn child(&self, relays: Vec<RelayRef>, facets: Vec<FacetRef>, resolvers: Resolvers) -> Self {
        let flow = self.node.flow.clone();
        let runtime = self.node.runtime.clone();
        let child = Self::spawn(relays, facets, resolvers, Some(self.clone()), flow, runtime);
        debug!(relays = ?child.node.relay_names, facets = child.node.facets.len(), "telemeter child created");
        child
    }

    /// Like [`child`](Self::child) but with its own flow settings.
    pub fn child_with_config(
        &self,
        relays: Vec<RelayRef>,
        facets: Vec<FacetRef>,
        resolvers: Resolvers,
        flow: FlowConfig,
    ) -> Result<Self> {
        flow.validate()?;
        let runtime = flow.runtime.clone().unwrap_or_else(|| self.node.runtime.clone());
        let child = Self::spawn(relays, facets, resolvers, Some(self.clone()), flow, runtime);
        debug!(
            relays = ?child.node.relay_names,
            overflow = ?child.node.flow.overflow,
            "telemeter child created with own flow config"
        );
        Ok(child)
    }

    fn spawn(
        relays: Vec<RelayRef>,
        facets: Vec<FacetRef>,
        resolvers: Resolvers,
        parent: Option<Telemeter>,
        flow: FlowConfig,
        runtime: Handle,
    ) -> Self {
        let scope = flow
            .scope
            .as_ref()
            .map_or_else(CancellationToken::new, CancellationToken::child_token);
        let events = Broadcast::new(flow.replay, flow.extra_buffer_capacity, flow.overflow);

        // Subscribe everything before the node can publish.
        let subscriptions: Vec<_> = relays
            .into_iter()
            .map(|relay| {
                let subscription = events.subscribe();
                (relay, subscription)
            })
            .collect();
        let relay_names = subscriptions
            .iter()
            .map(|(relay, _)| relay.name().to_string())
            .collect();

        let node = Arc::new(Node {
            id: Uuid::new_v4(),
            facets,
            resolvers,
            parent,
            flow,
            runtime,
            events,
            relay_names,
            scope,
        });

        let weak = Arc::downgrade(&node);
        for (relay, subscription) in subscriptions {
            node.runtime.spawn(containment::run_relay(
                relay,
                subscription,
                weak.clone(),
                node.id,
                node.scope.clone(),
            ));
        }

        Telemeter { node }
    }

    pub fn record(&self, event: &Event) {
        self.record_with(event, &[]);
    }

    /// Record `event` with `extra` facets appended after its own. Extra
    /// facets are not resolved.
    pub fn record_with(&self, event: &Event, extra: &[FacetRef]) {
        let node = &self.node;

        let mut incoming = resolve_facets(event.facets(), &node.resolvers);
        incoming.extend(extra.iter().cloned());
        let merged = event.rebuilt(compose(&node.facets, incoming, node.flow.propagate_thread_data));

        if !node.scope.is_cancelled() {
            node.events.publish(merged.clone());
        }
        if let Some(parent) = &node.parent {
            parent.record(&merged);
        }
    }

    /// Stop this node's relays. Parent and children are unaffected, and
    /// events recorded here still reach the parent.
    pub fn shutdown(&self) {
        if !self.node.scope.is_cancelled() {
            debug!(relays = ?self.node.relay_names, "telemeter shut down");
        }
        self.node.scope.cancel();
        self.node.events.close();
    }

    /// Identifies this node in relay-origin `Failure` facets.
    pub fn id(&self) -> Uuid {
        self.node.id
    }

    pub fn is_shut_down(&self) -> bool {
        self.node.scope.is_cancelled()
    }

    pub fn snapshot(&self) -> BroadcastSnapshot {
        self.node.events.snapshot()
    }

    pub fn flow(&self) -> &FlowConfig {
        &self.node.flow
    }

    pub fn facets(&self) -> &[FacetRef] {
        &self.node.facets
    }

    pub fn relay_names(&self) -> &[String] {
        &self.node.relay_names
    }

    pub fn parent(&self) -> Option<&Telemeter> {
        self.node.parent.as_ref()
    }
}

impl fmt::Debug for Telemeter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Telemeter")
            .field("id", &self.node.id)
            .field("relays", &self.node.relay_names)
            .field("facets", &self.node.facets)
            .field("resolvers", &self.node.resolvers)
            .field("has_parent", &self.node.parent.is_some())
            .finish()
    }
}

/// Collects relays, facets and resolvers for a root node.
#[derive(Default)]
pub struct TelemeterBuilder {
    relays: Vec<RelayRef>,
    facets: Vec<FacetRef>,
    resolvers: Resolvers,
    flow: FlowConfig,
}

impl TelemeterBuilder {
    pub fn relay<R: Relay + 'static>(mut self, relay: R) -> Self {
        self.relays.push(Arc::new(relay));
        self
    }

    pub fn relay_ref(mut self, relay: RelayRef) -> Self {
        self.relays.push(relay);
        self
    }

    pub fn facet<F: Facet>(mut self, facet: F) -> Self {
        self.facets.push(Arc::new(facet));
        self
    }

    pub fn resolver<R: FacetResolver + 'static>(mut self, resolver: R) -> Self {
        self.resolvers.insert(Arc::new(resolver));
        self
    }

    pub fn flow(mut self, flow: FlowConfig) -> Self {
        self.flow = flow;
        self
    }

    pub fn build(self) -> Result<Telemeter> {
        Telemeter::build(self.relays, self.facets, self.resolvers, self.flow)
    }
}
