//! Relays: independent, side-effecting consumers of events.
//!
//! Every relay attached to a node gets its own subscription and runs in its
//! own task. A relay reports failure by returning an error (or panicking);
//! the node turns that into a [`Failure`](crate::facet::Failure) event.

use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;

use crate::event::Event;
use crate::facet::Facet;

pub mod log;

pub use log::{LogRelay, LogRelayConfig, Message};

pub type RelayRef = Arc<dyn Relay>;

#[async_trait]
pub trait Relay: Send + Sync {
    /// Used in failure messages and diagnostics.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    async fn process(&self, event: &Event) -> anyhow::Result<()>;
}

/// A relay that only cares about one facet type.
///
/// `process_facet` runs once per matching facet, in event order. Wrap it in
/// [`Typed`] (or call [`typed`]) to attach it to a node.
#[async_trait]
pub trait TypedRelay: Send + Sync {
    type Facet: Facet;

    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    async fn process_facet(&self, facet: Arc<Self::Facet>) -> anyhow::Result<()>;
}

/// Adapts a [`TypedRelay`] to [`Relay`].
pub struct Typed<R>(pub R);

pub fn typed<R: TypedRelay>(relay: R) -> Typed<R> {
    Typed(relay)
}

#[async_trait]
impl<R: TypedRelay> Relay for Typed<R> {
    fn name(&self) -> &str {
        self.0.name()
    }

    async fn process(&self, event: &Event) -> anyhow::Result<()> {
        // The first failing facet aborts the rest of this event.
        for facet in event.facet_handles_of::<R::Facet>() {
            self.0.process_facet(facet).await?;
        }
        Ok(())
    }
}

/// Relay backed by an async closure.
pub struct FnRelay<F> {
    name: String,
    process: F,
}

pub fn relay_fn<F, Fut>(name: impl Into<String>, process: F) -> FnRelay<F>
where
    F: Fn(Event) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    FnRelay {
        name: name.into(),
        process,
    }
}

#[async_trait]
impl<F, Fut> Relay for FnRelay<F>
where
    F: Fn(Event) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn process(&self, event: &Event) -> anyhow::Result<()> {
        (self.process)(event.clone()).await
    }
}

/// Typed relay backed by an async closure over facets of type `T`.
pub struct TypedFnRelay<T, F> {
    name: String,
    process: F,
    _facet: PhantomData<fn(Arc<T>)>,
}

pub fn typed_relay_fn<T, F, Fut>(name: impl Into<String>, process: F) -> Typed<TypedFnRelay<T, F>>
where
    T: Facet,
    F: Fn(Arc<T>) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Typed(TypedFnRelay {
        name: name.into(),
        process,
        _facet: PhantomData,
    })
}

#[async_trait]
impl<T, F, Fut> TypedRelay for TypedFnRelay<T, F>
where
    T: Facet,
    F: Fn(Arc<T>) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    type Facet = T;

    fn name(&self) -> &str {
        &self.name
    }

    async fn process_facet(&self, facet: Arc<T>) -> anyhow::Result<()> {
        (self.process)(facet).await
    }
}
