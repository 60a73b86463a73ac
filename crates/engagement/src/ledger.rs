//! ActivityLedger - append-only, per-user log of feed events.
//!
//! Event ids and timestamps are assigned under the same lock that appends
//! the event, so ids increase in append order and the timestamp of a new
//! event is never earlier than the one before it (a clock stepping
//! backwards is clamped to the last issued timestamp). Each user's feed is
//! therefore already sorted by (timestamp, event id).

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::debug;

use crate::types::{EventId, EventType, FeedEvent, Operation, UserId};

/// Source of event timestamps
pub type Clock = fn() -> DateTime<Utc>;

#[derive(Debug)]
struct LedgerState {
    next_event_id: EventId,
    last_timestamp: Option<DateTime<Utc>>,
    events_by_user: HashMap<UserId, Vec<FeedEvent>>,
}

/// Append-only record of social and content actions
#[derive(Debug)]
pub struct ActivityLedger {
    state: Mutex<LedgerState>,
    clock: Clock,
}

impl ActivityLedger {
    pub fn new() -> Self {
        Self::with_clock(Utc::now)
    }

    /// Create a ledger that reads time from `clock`
    pub fn with_clock(clock: Clock) -> Self {
        Self {
            state: Mutex::new(LedgerState {
                next_event_id: 1,
                last_timestamp: None,
                events_by_user: HashMap::new(),
            }),
            clock,
        }
    }

    /// Append a new event for `user_id` and return it
    pub fn record(
        &self,
        user_id: UserId,
        event_type: EventType,
        operation: Operation,
        entity_id: u64,
    ) -> FeedEvent {
        let mut state = self.state.lock();

        let now = (self.clock)();
        let timestamp = match state.last_timestamp {
            Some(last) if last > now => last,
            _ => now,
        };
        let event_id = state.next_event_id;
        state.next_event_id += 1;
        state.last_timestamp = Some(timestamp);

        let event = FeedEvent {
            event_id,
            user_id,
            event_type,
            operation,
            entity_id,
            timestamp,
        };
        state
            .events_by_user
            .entry(user_id)
            .or_default()
            .push(event.clone());

        debug!(event_id, user_id, ?event_type, ?operation, entity_id, "feed event recorded");
        event
    }

    /// All events of a user, ascending by timestamp then event id.
    ///
    /// The result is a snapshot: calling again yields the events appended
    /// since, after the ones already returned.
    pub fn feed_for(&self, user_id: UserId) -> Vec<FeedEvent> {
        self.state
            .lock()
            .events_by_user
            .get(&user_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Delete a user's own events and every event that references the user
    /// as a friend. Returns the number of events removed.
    pub fn remove_user(&self, user_id: UserId) -> usize {
        let mut state = self.state.lock();
        let mut removed = state
            .events_by_user
            .remove(&user_id)
            .map_or(0, |events| events.len());
        removed += retain_events(&mut state, |event| {
            !(event.event_type == EventType::Friend && event.entity_id == user_id)
        });
        removed
    }

    /// Delete every event of `event_type` that references `entity_id`.
    /// Returns the number of events removed.
    pub fn remove_entity(&self, event_type: EventType, entity_id: u64) -> usize {
        let mut state = self.state.lock();
        retain_events(&mut state, |event| {
            !(event.event_type == event_type && event.entity_id == entity_id)
        })
    }

    /// Total number of events held
    pub fn len(&self) -> usize {
        self.state.lock().events_by_user.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ActivityLedger {
    fn default() -> Self {
        Self::new()
    }
}

fn retain_events(state: &mut LedgerState, keep: impl Fn(&FeedEvent) -> bool) -> usize {
    let mut removed = 0;
    for events in state.events_by_user.values_mut() {
        let before = events.len();
        events.retain(|event| keep(event));
        removed += before - events.len();
    }
    state.events_by_user.retain(|_, events| !events.is_empty());
    removed
}
