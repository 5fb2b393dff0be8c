#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use telemeter::{Event, Relay, RelayRef};

/// Relay that keeps every event it receives.
#[derive(Clone)]
pub struct Recorder {
    name: String,
    events: Arc<Mutex<Vec<Event>>>,
}

impl Recorder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn relay(&self) -> RelayRef {
        Arc::new(self.clone())
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    pub fn descriptions(&self) -> Vec<String> {
        self.events()
            .iter()
            .map(|e| e.description().to_string())
            .collect()
    }
}

#[async_trait]
impl Relay for Recorder {
    fn name(&self) -> &str {
        &self.name
    }

    async fn process(&self, event: &Event) -> anyhow::Result<()> {
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }
}

/// Relay that counts events, optionally sleeping on each one.
#[derive(Clone)]
pub struct Counter {
    count: Arc<AtomicUsize>,
    delay: Option<Duration>,
}

impl Counter {
    pub fn fast() -> Self {
        Self {
            count: Arc::new(AtomicUsize::new(0)),
            delay: None,
        }
    }

    pub fn slow(delay: Duration) -> Self {
        Self {
            count: Arc::new(AtomicUsize::new(0)),
            delay: Some(delay),
        }
    }

    pub fn relay(&self) -> RelayRef {
        Arc::new(self.clone())
    }

    pub fn get(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Relay for Counter {
    async fn process(&self, _event: &Event) -> anyhow::Result<()> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Poll `condition` until it holds, failing the test after `limit`.
pub async fn wait_until<F: Fn() -> bool>(limit: Duration, condition: F) {
    let polled = tokio::time::timeout(limit, async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    })
    .await;
    assert!(polled.is_ok(), "condition not met within {:?}", limit);
}

/// Give relay tasks a moment to (not) deliver anything else.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}
