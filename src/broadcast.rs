//! Bounded multi-subscriber ring buffer.
//!
//! Every subscriber reads the same sequence through its own cursor. The ring
//! keeps the last `replay` values for late subscribers plus whatever the
//! slowest subscriber has not read yet, up to `capacity` unread values per
//! subscriber. When a subscriber would exceed that, the overflow policy
//! decides: `DropOldest` advances its cursor past the oldest unread values,
//! `Suspend` parks the new value in an ordered pending queue until every
//! subscriber has room.
//!
//! `publish` never blocks.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;
use tracing::trace;

use crate::config::OverflowPolicy;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BroadcastSnapshot {
    /// Values accepted into the ring since creation.
    pub published: u64,
    /// Values currently held in the ring.
    pub buffered: usize,
    /// Values waiting for room under `Suspend`.
    pub pending: usize,
    pub subscribers: Vec<SubscriberSnapshot>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriberSnapshot {
    pub id: u64,
    /// Published but not yet read.
    pub lag: u64,
    /// Skipped because of `DropOldest`.
    pub dropped: u64,
}

pub struct Broadcast<T> {
    shared: Arc<Shared<T>>,
}

pub struct Subscription<T> {
    id: u64,
    shared: Arc<Shared<T>>,
}

struct Shared<T> {
    state: Mutex<State<T>>,
    notify: Notify,
    replay: usize,
    capacity: u64,
    policy: OverflowPolicy,
}

struct State<T> {
    ring: VecDeque<T>,
    /// Sequence number of `ring[0]`.
    head: u64,
    /// Sequence number the next accepted value gets.
    tail: u64,
    cursors: HashMap<u64, Cursor>,
    next_id: u64,
    pending: VecDeque<T>,
    closed: bool,
}

#[derive(Debug, Clone, Copy)]
struct Cursor {
    next: u64,
    dropped: u64,
}

impl<T> State<T> {
    fn has_room(&self, capacity: u64) -> bool {
        self.cursors
            .values()
            .all(|cursor| self.tail - cursor.next < capacity)
    }

    /// Accept `value`. Returns how many unread values were dropped.
    fn push(&mut self, value: T, replay: usize, capacity: u64) -> u64 {
        self.ring.push_back(value);
        self.tail += 1;

        let mut dropped = 0;
        for cursor in self.cursors.values_mut() {
            let unread = self.tail - cursor.next;
            if unread > capacity {
                let over = unread - capacity;
                cursor.next += over;
                cursor.dropped += over;
                dropped += over;
            }
        }

        self.trim(replay);
        dropped
    }

    /// Release ring slots that no subscriber and no replay window needs.
    fn trim(&mut self, replay: usize) {
        let replay_floor = self.tail.saturating_sub(replay as u64);
        let keep_from = self
            .cursors
            .values()
            .map(|cursor| cursor.next)
            .min()
            .map_or(replay_floor, |slowest| slowest.min(replay_floor))
            .max(self.head);

        while self.head < keep_from {
            self.ring.pop_front();
            self.head += 1;
        }
    }

    /// Move parked values into the ring while every subscriber has room.
    fn admit_pending(&mut self, replay: usize, capacity: u64) -> usize {
        let mut admitted = 0;
        while !self.pending.is_empty() && self.has_room(capacity) {
            if let Some(value) = self.pending.pop_front() {
                self.push(value, replay, capacity);
                admitted += 1;
            }
        }
        admitted
    }
}

impl<T: Clone + Send> Broadcast<T> {
    /// Capacity is `replay + extra_capacity`, and never less than one.
    pub fn new(replay: usize, extra_capacity: usize, policy: OverflowPolicy) -> Self {
        let capacity = replay.saturating_add(extra_capacity).max(1) as u64;
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(State {
                    ring: VecDeque::new(),
                    head: 0,
                    tail: 0,
                    cursors: HashMap::new(),
                    next_id: 0,
                    pending: VecDeque::new(),
                    closed: false,
                }),
                notify: Notify::new(),
                replay,
                capacity,
                policy,
            }),
        }
    }

    pub fn publish(&self, value: T) {
        let shared = &self.shared;
        let mut state = shared.lock();
        if state.closed {
            return;
        }

        match shared.policy {
            OverflowPolicy::DropOldest => {
                let dropped = state.push(value, shared.replay, shared.capacity);
                if dropped > 0 {
                    trace!(dropped, "broadcast overflow, oldest unread values dropped");
                }
            }
            OverflowPolicy::Suspend => {
                if state.pending.is_empty() && state.has_room(shared.capacity) {
                    state.push(value, shared.replay, shared.capacity);
                } else {
                    state.pending.push_back(value);
                }
            }
        }

        drop(state);
        shared.notify.notify_waiters();
    }

    /// New subscriber starting at the replay window.
    pub fn subscribe(&self) -> Subscription<T> {
        let mut state = self.shared.lock();
        let id = state.next_id;
        state.next_id += 1;
        let start = state
            .tail
            .saturating_sub(self.shared.replay as u64)
            .max(state.head);
        state.cursors.insert(
            id,
            Cursor {
                next: start,
                dropped: 0,
            },
        );
        Subscription {
            id,
            shared: Arc::clone(&self.shared),
        }
    }

    /// Stop accepting values. Subscribers drain what is buffered, then end.
    pub fn close(&self) {
        let mut state = self.shared.lock();
        state.closed = true;
        state.pending.clear();
        drop(state);
        self.shared.notify.notify_waiters();
    }

    pub fn subscriber_count(&self) -> usize {
        self.shared.lock().cursors.len()
    }

    pub fn snapshot(&self) -> BroadcastSnapshot {
        let state = self.shared.lock();
        let mut subscribers: Vec<SubscriberSnapshot> = state
            .cursors
            .iter()
            .map(|(id, cursor)| SubscriberSnapshot {
                id: *id,
                lag: state.tail - cursor.next,
                dropped: cursor.dropped,
            })
            .collect();
        subscribers.sort_by_key(|s| s.id);

        BroadcastSnapshot {
            published: state.tail,
            buffered: state.ring.len(),
            pending: state.pending.len(),
            subscribers,
        }
    }
}

impl<T> Shared<T> {
    fn lock(&self) -> MutexGuard<'_, State<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Clone + Send> Subscription<T> {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Next value in publication order, or `None` once the broadcast is
    /// closed and this subscriber has read everything.
    pub async fn recv(&mut self) -> Option<T> {
        loop {
            let notified = self.shared.notify.notified();
            tokio::pin!(notified);
            // Register before checking state so a publish in between is not missed.
            notified.as_mut().enable();

            {
                let mut state = self.shared.lock();
                let (value, admitted) = self.take(&mut state);
                if let Some(value) = value {
                    drop(state);
                    if admitted > 0 {
                        self.shared.notify.notify_waiters();
                    }
                    return Some(value);
                }
                if state.closed || !state.cursors.contains_key(&self.id) {
                    return None;
                }
            }

            notified.await;
        }
    }

    fn take(&self, state: &mut State<T>) -> (Option<T>, usize) {
        let shared = &self.shared;
        let Some(cursor) = state.cursors.get_mut(&self.id) else {
            return (None, 0);
        };
        if cursor.next >= state.tail {
            return (None, 0);
        }

        let index = (cursor.next - state.head) as usize;
        cursor.next += 1;
        let value = state.ring.get(index).cloned();

        state.trim(shared.replay);
        let admitted = match shared.policy {
            OverflowPolicy::Suspend => state.admit_pending(shared.replay, shared.capacity),
            OverflowPolicy::DropOldest => 0,
        };
        (value, admitted)
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        let shared = &self.shared;
        let mut state = shared.lock();
        state.cursors.remove(&self.id);
        state.trim(shared.replay);

        let mut admitted = 0;
        if shared.policy == OverflowPolicy::Suspend {
            admitted = state.admit_pending(shared.replay, shared.capacity);
        }
        drop(state);
        if admitted > 0 {
            shared.notify.notify_waiters();
        }
    }
}
