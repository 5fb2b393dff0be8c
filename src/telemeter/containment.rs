//! Relay tasks. Each relay drains its own subscription; errors and panics
//! are turned into `Failure` events recorded back at the same node.

use std::panic::AssertUnwindSafe;
use std::sync::Weak;

use anyhow::anyhow;
use futures::FutureExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use uuid::Uuid;

use super::{Node, Telemeter};
use crate::broadcast::Subscription;
use crate::event::Event;
use crate::facet::resolver::panic_message;
use crate::facet::{facet, Failure};
use crate::relay::RelayRef;

pub(super) async fn run_relay(
    relay: RelayRef,
    mut subscription: Subscription<Event>,
    node: Weak<Node>,
    node_id: Uuid,
    scope: CancellationToken,
) {
    let name = relay.name().to_string();
    debug!(relay = %name, subscriber = subscription.id(), "relay task started");

    loop {
        let event = tokio::select! {
            biased;
            _ = scope.cancelled() => break,
            next = subscription.recv() => match next {
                Some(event) => event,
                None => break,
            },
        };

        let outcome = tokio::select! {
            biased;
            _ = scope.cancelled() => break,
            outcome = AssertUnwindSafe(relay.process(&event)).catch_unwind() => outcome,
        };

        let error = match outcome {
            Ok(Ok(())) => continue,
            Ok(Err(e)) => e,
            Err(panic) => anyhow!("relay panicked: {}", panic_message(panic.as_ref())),
        };
        contain(&name, &event, error, &node, node_id);
    }

    debug!(relay = %name, "relay task stopped");
}

/// Record a relay failure as a new event at the node that owns the relay.
///
/// An event that already carries a relay-origin `Failure` from this node is
/// the product of an earlier containment here; failing on it again is only
/// logged. Failures contained at other nodes are re-recorded as usual.
fn contain(relay: &str, event: &Event, error: anyhow::Error, node: &Weak<Node>, node_id: Uuid) {
    if event
        .facets_of::<Failure>()
        .any(|failure| failure.is_relay_failure_at(node_id))
    {
        debug!(relay, node = %node_id, error = %error, "relay failed on a failure event, not re-recording");
        return;
    }

    let failure = Failure::from_relay(relay, node_id, error);
    warn!(relay, "{}", failure.message());

    // The node is gone once every handle has been dropped.
    let Some(node) = node.upgrade() else {
        return;
    };
    let description = failure.message().to_string();
    let telemeter = Telemeter { node };
    telemeter.record(&Event::with_facets(description, vec![facet(failure)]));
}
