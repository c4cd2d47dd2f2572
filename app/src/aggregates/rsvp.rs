//! RSVP admission for campus events.
//!
//! Every RSVP and cancellation for every event goes through one
//! [`AdmissionReducer`] running in a `Store`. The store runs the reducer under
//! its write lock, so the read of the confirmed count and the decision derived
//! from it can never interleave with another admission. That closes the
//! check-then-write race a plain "count rows, then upsert" handler has.
//!
//! # Seat ledgers
//!
//! The reducer keeps a [`SeatLedger`] per event: the event itself and the
//! latest RSVP of each user. A ledger is loaded on first use and dropped when
//! the event changes, a write fails, or too many ledgers sit idle; the next
//! request reloads it from the repositories.
//!
//! Loads are asynchronous, so two guards keep a reload from going stale:
//!
//! - each event has a generation, bumped on every eviction; a load started
//!   under an older generation is discarded and the request retried
//! - admissions whose write has not landed yet are kept as in-flight
//!   overlays and applied on top of any freshly loaded snapshot
//!
//! A second request from the same attendee waits until the first one's write
//! has landed, so writes for one `(user, event)` pair land in order.
//!
//! # Event writes
//!
//! Admin edits, cancellations and deletions are written through the store as
//! well. A write waits for the event's in-flight admissions to land, and new
//! admissions for the event are held until the write is done. Held requests
//! are then retried against a freshly loaded ledger.
//!
//! # Flow
//!
//! ```text
//! RequestRsvp ─► load user (+ ledger) ─► RsvpContextLoaded ─► decide, update ledger
//!                                                              │
//!                          RsvpRecorded / RsvpPersistFailed ◄──┘ upsert
//! CancelRsvp ─► cancel row ─► RsvpCancelled (release seat) / RsvpRejected
//! WriteEvent ─► (drain in-flight) ─► update/delete ─► EventWritten / EventWriteFailed
//! ```

use crate::error::RepositoryError;
use crate::notifications::{self, Mailer, templates};
use crate::stores::{EventRepository, RsvpRepository, UserRepository};
use crate::types::{Event, EventId, Rsvp, RsvpId, RsvpStatus, User, UserId};
use eventure_core::{SmallVec, effect::Effect, environment::Clock, reducer::Reducer, smallvec};
use eventure_runtime::Store;
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use uuid::Uuid;

/// Ledgers kept in memory before idle ones are dropped.
pub const DEFAULT_MAX_LEDGERS: usize = 1024;

// ============================================================================
// Admission rule
// ============================================================================

/// Where an admitted RSVP lands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Admission {
    /// Holds one of the event's seats
    Seat,
    /// Confirmed, but over capacity
    Waitlist,
}

/// Decide an admission.
///
/// `confirmed` counts every confirmed RSVP of the event, waitlisted ones and
/// the requester's own included. Below `seat_limit` the request gets a seat,
/// otherwise the waitlist.
#[must_use]
pub const fn decide(confirmed: u32, seat_limit: u32) -> Admission {
    if confirmed < seat_limit {
        Admission::Seat
    } else {
        Admission::Waitlist
    }
}

/// Seat counts for an event.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatSummary {
    /// RSVPs holding a seat
    pub confirmed: u32,
    /// Confirmed RSVPs on the waitlist
    pub waitlisted: u32,
    /// How many more requests would get a seat
    pub seats_remaining: u32,
}

impl SeatSummary {
    /// Count the RSVPs of one event.
    pub fn count<'a>(seat_limit: u32, rsvps: impl IntoIterator<Item = &'a Rsvp>) -> Self {
        let (confirmed, waitlisted) = rsvps.into_iter().fold((0_u32, 0_u32), |(c, w), rsvp| {
            (c + u32::from(rsvp.holds_seat()), w + u32::from(rsvp.is_waitlisted()))
        });
        Self {
            confirmed,
            waitlisted,
            seats_remaining: seat_limit.saturating_sub(confirmed + waitlisted),
        }
    }
}

// ============================================================================
// State
// ============================================================================

/// The event and the latest RSVP of each user, as admission sees them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeatLedger {
    event: Event,
    entries: HashMap<UserId, Rsvp>,
    touched: u64,
}

impl SeatLedger {
    /// Build a ledger from the stored RSVPs of `event`.
    #[must_use]
    pub fn new(event: Event, rsvps: Vec<Rsvp>) -> Self {
        let entries = rsvps.into_iter().map(|rsvp| (rsvp.user_id, rsvp)).collect();
        Self { event, entries, touched: 0 }
    }

    /// The event this ledger admits to.
    #[must_use]
    pub const fn event(&self) -> &Event {
        &self.event
    }

    /// Confirmed RSVPs, seated or waitlisted.
    #[must_use]
    pub fn confirmed(&self) -> u32 {
        let summary = self.summary();
        summary.confirmed + summary.waitlisted
    }

    /// Seats currently held.
    #[must_use]
    pub fn seats_held(&self) -> u32 {
        self.summary().confirmed
    }

    /// Counts for this event.
    #[must_use]
    pub fn summary(&self) -> SeatSummary {
        SeatSummary::count(self.event.seat_limit, self.entries.values())
    }

    /// The RSVP of `user_id`, if any.
    #[must_use]
    pub fn entry(&self, user_id: &UserId) -> Option<&Rsvp> {
        self.entries.get(user_id)
    }

    /// Where the next request lands.
    #[must_use]
    pub fn admit(&self) -> Admission {
        decide(self.confirmed(), self.event.seat_limit)
    }

    fn record(&mut self, rsvp: Rsvp) {
        self.entries.insert(rsvp.user_id, rsvp);
    }

    fn release(&mut self, user_id: &UserId) {
        if let Some(rsvp) = self.entries.get_mut(user_id) {
            rsvp.status = RsvpStatus::Cancelled;
        }
    }
}

/// An admission whose write has not been acknowledged yet.
#[derive(Clone, Debug, PartialEq, Eq)]
struct InFlight {
    correlation_id: Uuid,
    rsvp: Rsvp,
    /// Later requests from the same attendee
    waiting: Vec<RsvpRequest>,
}

/// Admin writes queued for one event, and the admissions they hold back.
#[derive(Clone, Debug, Default)]
struct PendingWrites {
    queue: VecDeque<EventWrite>,
    running: bool,
    held: Vec<RsvpRequest>,
}

/// Admission state across all events.
#[derive(Clone, Debug)]
pub struct AdmissionState {
    ledgers: HashMap<EventId, SeatLedger>,
    generations: HashMap<EventId, u64>,
    epoch: u64,
    in_flight: HashMap<EventId, HashMap<UserId, InFlight>>,
    writes: HashMap<EventId, PendingWrites>,
    max_ledgers: usize,
    tick: u64,
}

impl Default for AdmissionState {
    fn default() -> Self {
        Self::new()
    }
}

impl AdmissionState {
    /// Creates an empty state holding up to [`DEFAULT_MAX_LEDGERS`] ledgers.
    #[must_use]
    pub fn new() -> Self {
        Self::with_ledger_capacity(DEFAULT_MAX_LEDGERS)
    }

    /// Creates an empty state holding up to `max_ledgers` ledgers (at least one).
    #[must_use]
    pub fn with_ledger_capacity(max_ledgers: usize) -> Self {
        Self {
            ledgers: HashMap::new(),
            generations: HashMap::new(),
            epoch: 0,
            in_flight: HashMap::new(),
            writes: HashMap::new(),
            max_ledgers: max_ledgers.max(1),
            tick: 0,
        }
    }

    /// The cached ledger for an event.
    #[must_use]
    pub fn ledger(&self, event_id: &EventId) -> Option<&SeatLedger> {
        self.ledgers.get(event_id)
    }

    /// Number of cached ledgers.
    #[must_use]
    pub fn cached_ledgers(&self) -> usize {
        self.ledgers.len()
    }

    /// Admissions still waiting for their write.
    #[must_use]
    pub fn in_flight(&self, event_id: &EventId) -> usize {
        self.in_flight.get(event_id).map_or(0, HashMap::len)
    }

    /// Requests held back by a pending event write.
    #[must_use]
    pub fn held(&self, event_id: &EventId) -> usize {
        self.writes.get(event_id).map_or(0, |w| w.held.len())
    }

    /// Install a ledger directly, bypassing the repositories.
    pub fn insert_ledger(&mut self, mut ledger: SeatLedger) {
        self.make_room();
        ledger.touched = self.touch();
        self.ledgers.insert(ledger.event.id, ledger);
    }

    fn touch(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    fn generation(&self, event_id: &EventId) -> u64 {
        self.epoch + self.generations.get(event_id).copied().unwrap_or(0)
    }

    fn evict(&mut self, event_id: EventId) {
        self.ledgers.remove(&event_id);
        *self.generations.entry(event_id).or_default() += 1;
    }

    /// Drop everything kept for a deleted event.
    ///
    /// Its generation is folded into the epoch so no generation ever repeats.
    fn forget(&mut self, event_id: EventId) {
        self.ledgers.remove(&event_id);
        let bumps = self.generations.remove(&event_id).unwrap_or(0);
        self.epoch += bumps + 1;
    }

    fn evict_all(&mut self) {
        self.ledgers.clear();
        self.epoch += 1;
    }

    /// Evict least recently used ledgers until one more fits.
    fn make_room(&mut self) {
        while self.ledgers.len() >= self.max_ledgers {
            let Some(idle) = self.ledgers.values().min_by_key(|l| l.touched).map(|l| l.event.id) else {
                break;
            };
            tracing::debug!(event_id = %idle, "Evicting idle seat ledger");
            self.evict(idle);
        }
    }

    /// Install a loaded snapshot unless a ledger is already cached.
    fn install(&mut self, snapshot: LedgerSnapshot) {
        let event_id = snapshot.event.id;
        if self.ledgers.contains_key(&event_id) {
            return;
        }
        let mut ledger = SeatLedger::new(snapshot.event, snapshot.rsvps);
        for pending in self.in_flight.get(&event_id).into_iter().flat_map(HashMap::values) {
            ledger.record(pending.rsvp.clone());
        }
        self.insert_ledger(ledger);
    }

    /// Drop the in-flight entry of this request.
    ///
    /// Returns whether it was still current, and the requests that queued
    /// up behind it.
    fn settle(&mut self, event_id: &EventId, user_id: &UserId, correlation_id: Uuid) -> (bool, Vec<RsvpRequest>) {
        let Some(pending) = self.in_flight.get_mut(event_id) else {
            return (false, Vec::new());
        };
        if !pending.get(user_id).is_some_and(|p| p.correlation_id == correlation_id) {
            return (false, Vec::new());
        }
        let waiting = pending.remove(user_id).map(|p| p.waiting).unwrap_or_default();
        if pending.is_empty() {
            self.in_flight.remove(event_id);
        }
        (true, waiting)
    }

    /// Park a request behind a pending event write, or hand it back.
    fn hold(&mut self, request: RsvpRequest) -> Result<(), RsvpRequest> {
        match self.writes.get_mut(&request.event_id) {
            Some(writes) => {
                tracing::debug!(event_id = %request.event_id, "Holding admission behind event write");
                writes.held.push(request);
                Ok(())
            },
            None => Err(request),
        }
    }
}

// ============================================================================
// Actions
// ============================================================================

/// An attendee asking for a seat.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RsvpRequest {
    /// Matches the outcome to the waiting request
    pub correlation_id: Uuid,
    /// Attendee
    pub user_id: UserId,
    /// Event
    pub event_id: EventId,
    /// Free-form notes
    pub notes: Option<String>,
}

/// An attendee withdrawing their RSVP.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CancelRequest {
    /// Matches the outcome to the waiting request
    pub correlation_id: Uuid,
    /// Attendee
    pub user_id: UserId,
    /// Event
    pub event_id: EventId,
}

/// An admin change to an event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EventChange {
    /// Store a new version of the event
    Update(Event),
    /// Remove the event and its RSVPs
    Delete(EventId),
}

impl EventChange {
    /// The event being changed.
    #[must_use]
    pub fn event_id(&self) -> EventId {
        match self {
            Self::Update(event) => event.id,
            Self::Delete(id) => *id,
        }
    }
}

/// An admin change written through the admission store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventWrite {
    /// Matches the outcome to the waiting request
    pub correlation_id: Uuid,
    /// What to write
    pub change: EventChange,
}

/// An event and its RSVPs as read from the repositories.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LedgerSnapshot {
    /// The event
    pub event: Event,
    /// Its stored RSVPs
    pub rsvps: Vec<Rsvp>,
}

/// Why a request was turned down.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    /// The attendee no longer exists
    #[error("User not found")]
    UserNotFound,
    /// The event does not exist
    #[error("Event not found")]
    EventNotFound,
    /// The event was called off
    #[error("Event has been cancelled")]
    EventCancelled,
    /// A repository failed
    #[error("storage error: {0}")]
    Storage(String),
}

impl Rejection {
    /// Metric label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::UserNotFound => "user_not_found",
            Self::EventNotFound => "event_not_found",
            Self::EventCancelled => "event_cancelled",
            Self::Storage(_) => "storage",
        }
    }

    fn from_repository(error: RepositoryError) -> Self {
        match error {
            RepositoryError::NotFound { .. } => Self::EventNotFound,
            other => Self::Storage(other.to_string()),
        }
    }
}

/// Commands and effect results of the admission reducer.
#[derive(Clone, Debug)]
pub enum RsvpAction {
    // Commands
    /// Ask for a seat (or a waitlist spot)
    RequestRsvp(RsvpRequest),
    /// Withdraw an RSVP
    CancelRsvp(CancelRequest),
    /// Edit, cancel or delete an event
    WriteEvent(EventWrite),
    /// Drop every cached ledger (e.g. after a user was deleted)
    LedgersInvalidated,

    // Effect results
    /// A request re-issued after a stale load or a hold
    RetryRsvp(RsvpRequest),
    /// The user and, when not cached, the ledger were loaded
    RsvpContextLoaded {
        /// The original request
        request: RsvpRequest,
        /// Event generation the load started under
        generation: u64,
        /// The attendee
        user: User,
        /// `None` when the ledger was cached at request time
        snapshot: Option<LedgerSnapshot>,
    },
    /// Outcome: the RSVP was admitted and stored
    RsvpRecorded {
        /// Request
        correlation_id: Uuid,
        /// The stored RSVP
        rsvp: Rsvp,
        /// Seat or waitlist
        admission: Admission,
        /// The attendee
        user: User,
        /// The event
        event: Event,
    },
    /// Outcome: the admission was decided but the write failed
    RsvpPersistFailed {
        /// Request
        correlation_id: Uuid,
        /// Event
        event_id: EventId,
        /// Attendee
        user_id: UserId,
        /// Repository message
        reason: String,
    },
    /// Outcome: the attendee's RSVP rows were marked cancelled
    RsvpCancelled {
        /// Request
        correlation_id: Uuid,
        /// Event
        event_id: EventId,
        /// Attendee
        user_id: UserId,
        /// Rows changed, zero when there was nothing to cancel
        count: u64,
    },
    /// Outcome: the request was turned down
    RsvpRejected {
        /// Request
        correlation_id: Uuid,
        /// Why
        reason: Rejection,
    },
    /// Outcome: an event write landed
    EventWritten {
        /// Request
        correlation_id: Uuid,
        /// Event
        event_id: EventId,
        /// The stored event, `None` after a delete
        event: Option<Event>,
    },
    /// Outcome: an event write failed
    EventWriteFailed {
        /// Request
        correlation_id: Uuid,
        /// Event
        event_id: EventId,
        /// Why
        reason: Rejection,
    },
}

impl RsvpAction {
    /// The correlation id if this action ends a request.
    #[must_use]
    pub const fn outcome_for(&self) -> Option<Uuid> {
        match self {
            Self::RsvpRecorded { correlation_id, .. }
            | Self::RsvpPersistFailed { correlation_id, .. }
            | Self::RsvpCancelled { correlation_id, .. }
            | Self::RsvpRejected { correlation_id, .. }
            | Self::EventWritten { correlation_id, .. }
            | Self::EventWriteFailed { correlation_id, .. } => Some(*correlation_id),
            _ => None,
        }
    }
}

// ============================================================================
// Environment
// ============================================================================

/// Dependencies of the admission reducer.
#[derive(Clone)]
pub struct AdmissionEnvironment {
    /// Clock for timestamps
    pub clock: Arc<dyn Clock>,
    /// Attendee lookups
    pub users: Arc<dyn UserRepository>,
    /// Event reads and admin writes
    pub events: Arc<dyn EventRepository>,
    /// RSVP reads and writes
    pub rsvps: Arc<dyn RsvpRepository>,
    /// Confirmation emails
    pub mailer: Arc<dyn Mailer>,
}

impl AdmissionEnvironment {
    /// Creates a new `AdmissionEnvironment`
    #[must_use]
    pub fn new(
        clock: Arc<dyn Clock>,
        users: Arc<dyn UserRepository>,
        events: Arc<dyn EventRepository>,
        rsvps: Arc<dyn RsvpRepository>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        Self { clock, users, events, rsvps, mailer }
    }
}

/// The admission store shared by all request handlers.
pub type AdmissionStore = Store<AdmissionState, RsvpAction, AdmissionEnvironment, AdmissionReducer>;

// ============================================================================
// Reducer
// ============================================================================

type Effects = SmallVec<[Effect<RsvpAction>; 4]>;

fn retry_all(requests: Vec<RsvpRequest>) -> Effects {
    requests.into_iter().map(|request| Effect::emit(RsvpAction::RetryRsvp(request))).collect()
}

/// Serializes every admission decision.
#[derive(Clone, Debug, Default)]
pub struct AdmissionReducer;

impl AdmissionReducer {
    /// Creates a new `AdmissionReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn reject(correlation_id: Uuid, reason: Rejection) -> Effects {
        smallvec![Effect::emit(RsvpAction::RsvpRejected { correlation_id, reason })]
    }

    fn begin(state: &mut AdmissionState, request: RsvpRequest, env: &AdmissionEnvironment) -> Effects {
        match state.hold(request) {
            Ok(()) => SmallVec::new(),
            Err(request) => Self::load_context(state, request, env),
        }
    }

    fn load_context(state: &AdmissionState, request: RsvpRequest, env: &AdmissionEnvironment) -> Effects {
        let generation = state.generation(&request.event_id);
        let cached = state.ledgers.contains_key(&request.event_id);
        let users = Arc::clone(&env.users);
        let events = Arc::clone(&env.events);
        let rsvps = Arc::clone(&env.rsvps);

        smallvec![Effect::future(async move {
            let correlation_id = request.correlation_id;
            let rejected = |reason| Some(RsvpAction::RsvpRejected { correlation_id, reason });

            let user = match users.find_by_id(request.user_id).await {
                Ok(Some(user)) => user,
                Ok(None) => return rejected(Rejection::UserNotFound),
                Err(e) => return rejected(Rejection::Storage(e.to_string())),
            };

            let snapshot = if cached {
                None
            } else {
                let event = match events.find_by_id(request.event_id).await {
                    Ok(Some(event)) => event,
                    Ok(None) => return rejected(Rejection::EventNotFound),
                    Err(e) => return rejected(Rejection::Storage(e.to_string())),
                };
                match rsvps.list_for_event(request.event_id).await {
                    Ok(rsvps) => Some(LedgerSnapshot { event, rsvps }),
                    Err(e) => return rejected(Rejection::Storage(e.to_string())),
                }
            };

            Some(RsvpAction::RsvpContextLoaded { request, generation, user, snapshot })
        })]
    }

    fn admit(
        state: &mut AdmissionState,
        request: RsvpRequest,
        generation: u64,
        user: User,
        snapshot: Option<LedgerSnapshot>,
        env: &AdmissionEnvironment,
    ) -> Effects {
        let event_id = request.event_id;

        let request = match state.hold(request) {
            Ok(()) => return SmallVec::new(),
            Err(request) => request,
        };
        if generation != state.generation(&event_id) {
            tracing::debug!(%event_id, "Ledger changed while loading, retrying admission");
            return smallvec![Effect::emit(RsvpAction::RetryRsvp(request))];
        }
        let user_id = request.user_id;
        if let Some(pending) = state.in_flight.get_mut(&event_id).and_then(|p| p.get_mut(&user_id)) {
            pending.waiting.push(request);
            return SmallVec::new();
        }
        if let Some(snapshot) = snapshot {
            state.install(snapshot);
        }
        let touched = state.touch();
        let Some(ledger) = state.ledgers.get_mut(&event_id) else {
            return smallvec![Effect::emit(RsvpAction::RetryRsvp(request))];
        };
        ledger.touched = touched;

        if ledger.event.is_cancelled() {
            return Self::reject(request.correlation_id, Rejection::EventCancelled);
        }

        let admission = ledger.admit();
        let now = env.clock.now();
        let (id, created_at) = ledger
            .entry(&request.user_id)
            .map_or((RsvpId::new(), now), |existing| (existing.id, existing.created_at));
        let rsvp = Rsvp {
            id,
            user_id: request.user_id,
            event_id,
            status: RsvpStatus::Confirmed,
            waitlist: admission == Admission::Waitlist,
            notes: request.notes,
            created_at,
            updated_at: now,
        };
        ledger.record(rsvp.clone());
        let event = ledger.event.clone();

        tracing::info!(
            correlation_id = %request.correlation_id,
            %event_id,
            user_id = %request.user_id,
            ?admission,
            confirmed = ledger.confirmed(),
            seat_limit = event.seat_limit,
            "RSVP admitted"
        );
        match admission {
            Admission::Seat => metrics::counter!("eventure.rsvp.confirmed").increment(1),
            Admission::Waitlist => metrics::counter!("eventure.rsvp.waitlisted").increment(1),
        }

        let correlation_id = request.correlation_id;
        state.in_flight.entry(event_id).or_default().insert(
            request.user_id,
            InFlight { correlation_id, rsvp: rsvp.clone(), waiting: Vec::new() },
        );

        let rsvps = Arc::clone(&env.rsvps);
        smallvec![Effect::future(async move {
            let user_id = rsvp.user_id;
            match rsvps.upsert(rsvp).await {
                Ok(rsvp) => Some(RsvpAction::RsvpRecorded { correlation_id, rsvp, admission, user, event }),
                Err(e) => Some(RsvpAction::RsvpPersistFailed {
                    correlation_id,
                    event_id,
                    user_id,
                    reason: e.to_string(),
                }),
            }
        })]
    }

    fn cancel(request: CancelRequest, env: &AdmissionEnvironment) -> Effects {
        let rsvps = Arc::clone(&env.rsvps);
        let now = env.clock.now();

        smallvec![Effect::future(async move {
            let CancelRequest { correlation_id, user_id, event_id } = request;
            match rsvps.cancel(user_id, event_id, now).await {
                Ok(count) => Some(RsvpAction::RsvpCancelled { correlation_id, event_id, user_id, count }),
                Err(e) => Some(RsvpAction::RsvpRejected {
                    correlation_id,
                    reason: Rejection::Storage(e.to_string()),
                }),
            }
        })]
    }

    /// Start the next queued write of an event once its admissions have landed.
    fn next_write(state: &mut AdmissionState, event_id: EventId, env: &AdmissionEnvironment) -> Effects {
        if state.in_flight(&event_id) > 0 {
            return SmallVec::new();
        }
        let Some(writes) = state.writes.get_mut(&event_id) else {
            return SmallVec::new();
        };
        if writes.running {
            return SmallVec::new();
        }
        let Some(EventWrite { correlation_id, change }) = writes.queue.pop_front() else {
            return SmallVec::new();
        };
        writes.running = true;

        let events = Arc::clone(&env.events);
        smallvec![Effect::future(async move {
            let written = match change {
                EventChange::Update(event) => events.update(event).await.map(Some),
                EventChange::Delete(id) => events.delete(id).await.map(|()| None),
            };
            Some(match written {
                Ok(event) => RsvpAction::EventWritten { correlation_id, event_id, event },
                Err(e) => RsvpAction::EventWriteFailed {
                    correlation_id,
                    event_id,
                    reason: Rejection::from_repository(e),
                },
            })
        })]
    }

    /// A write finished: reload on next use, then run the next write or
    /// release the held requests.
    fn finish_write(
        state: &mut AdmissionState,
        event_id: EventId,
        deleted: bool,
        env: &AdmissionEnvironment,
    ) -> Effects {
        if deleted {
            state.forget(event_id);
        } else {
            state.evict(event_id);
        }
        let Some(writes) = state.writes.get_mut(&event_id) else {
            return SmallVec::new();
        };
        writes.running = false;
        if !writes.queue.is_empty() {
            return Self::next_write(state, event_id, env);
        }
        let held = state.writes.remove(&event_id).map(|w| w.held).unwrap_or_default();
        retry_all(held)
    }
}

impl Reducer for AdmissionReducer {
    type State = AdmissionState;
    type Action = RsvpAction;
    type Environment = AdmissionEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            // ========== Commands ==========
            RsvpAction::RequestRsvp(request) => {
                metrics::counter!("eventure.rsvp.requests").increment(1);
                Self::begin(state, request, env)
            },

            RsvpAction::CancelRsvp(request) => Self::cancel(request, env),

            RsvpAction::WriteEvent(write) => {
                let event_id = write.change.event_id();
                tracing::debug!(%event_id, correlation_id = %write.correlation_id, "Queueing event write");
                state.writes.entry(event_id).or_default().queue.push_back(write);
                Self::next_write(state, event_id, env)
            },

            RsvpAction::LedgersInvalidated => {
                tracing::debug!(cached = state.ledgers.len(), "Evicting all seat ledgers");
                state.evict_all();
                SmallVec::new()
            },

            // ========== Effect results ==========
            RsvpAction::RetryRsvp(request) => Self::begin(state, request, env),

            RsvpAction::RsvpContextLoaded { request, generation, user, snapshot } => {
                Self::admit(state, request, generation, user, snapshot, env)
            },

            RsvpAction::RsvpRecorded { correlation_id, rsvp, user, event, .. } => {
                let (current, waiting) = state.settle(&rsvp.event_id, &rsvp.user_id, correlation_id);
                if current {
                    if let Some(ledger) = state.ledgers.get_mut(&rsvp.event_id) {
                        ledger.record(rsvp.clone());
                    }
                }

                let mut effects = Self::next_write(state, rsvp.event_id, env);
                effects.extend(retry_all(waiting));
                let mailer = Arc::clone(&env.mailer);
                effects.push(Effect::future(async move {
                    let email = templates::rsvp_confirmation(&user, &event, &rsvp);
                    notifications::deliver(mailer.as_ref(), email).await;
                    None
                }));
                effects
            },

            RsvpAction::RsvpPersistFailed { correlation_id, event_id, user_id, reason } => {
                tracing::error!(%correlation_id, %event_id, %user_id, %reason, "Failed to store RSVP");
                metrics::counter!("eventure.rsvp.rejected", "reason" => "storage").increment(1);
                let (_, waiting) = state.settle(&event_id, &user_id, correlation_id);
                // The ledger already counts the failed write.
                state.evict(event_id);

                let mut effects = Self::next_write(state, event_id, env);
                effects.extend(retry_all(waiting));
                effects
            },

            RsvpAction::RsvpCancelled { correlation_id, event_id, user_id, count } => {
                tracing::info!(%correlation_id, %event_id, %user_id, count, "RSVP cancelled");
                if count > 0 {
                    metrics::counter!("eventure.rsvp.cancelled").increment(1);
                    if let Some(ledger) = state.ledgers.get_mut(&event_id) {
                        ledger.release(&user_id);
                    }
                }
                SmallVec::new()
            },

            RsvpAction::RsvpRejected { correlation_id, reason } => {
                tracing::info!(%correlation_id, %reason, "RSVP request rejected");
                metrics::counter!("eventure.rsvp.rejected", "reason" => reason.label()).increment(1);
                SmallVec::new()
            },

            RsvpAction::EventWritten { correlation_id, event_id, event } => {
                tracing::info!(%correlation_id, %event_id, deleted = event.is_none(), "Event write landed");
                Self::finish_write(state, event_id, event.is_none(), env)
            },

            RsvpAction::EventWriteFailed { correlation_id, event_id, reason } => {
                tracing::warn!(%correlation_id, %event_id, %reason, "Event write failed");
                Self::finish_write(state, event_id, false, env)
            },
        }
    }
}
