//! In-process telemetry pipeline.
//!
//! Application code records [`Event`]s carrying typed [`facet`]s on a tree of
//! [`Telemeter`] nodes. Each node resolves deferred facets, prepends its own
//! scope facets and fans the event out to its [`Relay`]s before forwarding
//! it to its parent.
//!
//! # INVARIANT
//! Recording never fails and never waits for a relay. Relay and resolver
//! failures come back as events, never as errors to the caller.

pub mod broadcast;
pub mod config;
pub mod error;
pub mod event;
pub mod facet;
pub mod logging;
pub mod relay;
pub mod telemeter;

pub use broadcast::{BroadcastSnapshot, SubscriberSnapshot};
pub use config::{FlowConfig, OverflowPolicy};
pub use error::{Result, TelemetryError};
pub use event::Event;
pub use facet::{Facet, FacetRef, Failure, Prefix, Resolvers, Significance};
pub use relay::{Relay, RelayRef, TypedRelay};
pub use telemeter::{Telemeter, TelemeterBuilder};
