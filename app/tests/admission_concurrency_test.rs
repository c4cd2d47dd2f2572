//! Concurrency tests for RSVP admission.
//!
//! Many requests for the same event race through the admission store; the
//! number of seated attendees must never exceed the seat limit.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use eventure::aggregates::rsvp::{
    Admission, AdmissionEnvironment, AdmissionReducer, AdmissionState, AdmissionStore, CancelRequest,
    EventChange, EventWrite, Rejection, RsvpAction, RsvpRequest,
};
use eventure::error::RepositoryError;
use eventure::notifications::{Mailer, RecordingMailer};
use eventure::stores::{RepoResult, Repositories, RsvpRepository};
use eventure::{Event, EventId, EventStatus, Role, Rsvp, User, UserId};
use eventure_core::environment::Clock;
use eventure_testing::test_clock;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use uuid::Uuid;

const WAIT: Duration = Duration::from_secs(5);

/// Delegates to another repository, failing upserts while the flag is set.
struct FlakyRsvps {
    inner: Arc<dyn RsvpRepository>,
    failing: Arc<AtomicBool>,
}

#[async_trait]
impl RsvpRepository for FlakyRsvps {
    async fn upsert(&self, rsvp: Rsvp) -> RepoResult<Rsvp> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(RepositoryError::Storage("connection reset".to_string()));
        }
        self.inner.upsert(rsvp).await
    }

    async fn find(&self, user_id: UserId, event_id: EventId) -> RepoResult<Option<Rsvp>> {
        self.inner.find(user_id, event_id).await
    }

    async fn list_for_event(&self, event_id: EventId) -> RepoResult<Vec<Rsvp>> {
        self.inner.list_for_event(event_id).await
    }

    async fn list_for_user(&self, user_id: UserId) -> RepoResult<Vec<Rsvp>> {
        self.inner.list_for_user(user_id).await
    }

    async fn cancel(&self, user_id: UserId, event_id: EventId, at: DateTime<Utc>) -> RepoResult<u64> {
        self.inner.cancel(user_id, event_id, at).await
    }
}

struct Harness {
    repos: Repositories,
    mailer: Arc<RecordingMailer>,
    store: Arc<AdmissionStore>,
}

impl Harness {
    fn new() -> Self {
        Self::with(RecordingMailer::new(), |rsvps| rsvps)
    }

    fn with(
        mailer: RecordingMailer,
        rsvps: impl FnOnce(Arc<dyn RsvpRepository>) -> Arc<dyn RsvpRepository>,
    ) -> Self {
        let mut repos = Repositories::in_memory();
        repos.rsvps = rsvps(Arc::clone(&repos.rsvps));
        let mailer = Arc::new(mailer);
        let environment = AdmissionEnvironment::new(
            Arc::new(test_clock()),
            Arc::clone(&repos.users),
            Arc::clone(&repos.events),
            Arc::clone(&repos.rsvps),
            Arc::clone(&mailer) as Arc<dyn Mailer>,
        );
        let store = Arc::new(AdmissionStore::new(
            AdmissionState::new(),
            AdmissionReducer::new(),
            environment,
        ));
        Self { repos, mailer, store }
    }

    async fn event(&self, seat_limit: u32) -> Event {
        let now = test_clock().now();
        let event = Event {
            id: EventId::new(),
            title: "Rust Meetup".to_string(),
            description: None,
            date: NaiveDate::from_ymd_opt(2026, 4, 1).unwrap(),
            start_time: NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(20, 0, 0).unwrap(),
            seat_limit,
            status: EventStatus::Published,
            category_id: None,
            location_id: None,
            club_id: None,
            banner_image: None,
            created_by: None,
            created_at: now,
            updated_at: now,
        };
        self.repos.events.create(event).await.unwrap()
    }

    async fn user(&self, n: usize) -> User {
        let user = User {
            id: UserId::new(),
            name: format!("Student {n}"),
            email: format!("student{n}@campus.edu"),
            password_hash: String::new(),
            role: Role::Attendee,
            phone_number: None,
            created_at: test_clock().now(),
        };
        self.repos.users.create(user).await.unwrap()
    }

    async fn rsvp(&self, user_id: UserId, event_id: EventId) -> RsvpAction {
        rsvp(&self.store, user_id, event_id).await
    }

    async fn cancel(&self, user_id: UserId, event_id: EventId) -> RsvpAction {
        let correlation_id = Uuid::new_v4();
        self.store
            .send_and_wait_for(
                RsvpAction::CancelRsvp(CancelRequest { correlation_id, user_id, event_id }),
                move |a| a.outcome_for() == Some(correlation_id),
                WAIT,
            )
            .await
            .expect("cancel outcome")
    }

    async fn write(&self, change: EventChange) -> RsvpAction {
        let correlation_id = Uuid::new_v4();
        self.store
            .send_and_wait_for(
                RsvpAction::WriteEvent(EventWrite { correlation_id, change }),
                move |a| a.outcome_for() == Some(correlation_id),
                WAIT,
            )
            .await
            .expect("event write outcome")
    }

    async fn seated(&self, event_id: EventId) -> usize {
        let rsvps = self.repos.rsvps.list_for_event(event_id).await.unwrap();
        rsvps.iter().filter(|r| r.holds_seat()).count()
    }
}

async fn rsvp(store: &AdmissionStore, user_id: UserId, event_id: EventId) -> RsvpAction {
    let correlation_id = Uuid::new_v4();
    store
        .send_and_wait_for(
            RsvpAction::RequestRsvp(RsvpRequest { correlation_id, user_id, event_id, notes: None }),
            move |a| a.outcome_for() == Some(correlation_id),
            WAIT,
        )
        .await
        .expect("rsvp outcome")
}

fn admission_of(outcome: &RsvpAction) -> Admission {
    match outcome {
        RsvpAction::RsvpRecorded { admission, .. } => *admission,
        other => panic!("expected RsvpRecorded, got {other:?}"),
    }
}

fn cancelled_count(outcome: &RsvpAction) -> u64 {
    match outcome {
        RsvpAction::RsvpCancelled { count, .. } => *count,
        other => panic!("expected RsvpCancelled, got {other:?}"),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn last_seat_goes_to_exactly_one_of_two_racers() {
    let h = Harness::new();
    let event = h.event(1).await;
    let a = h.user(1).await;
    let b = h.user(2).await;

    let (first, second) = tokio::join!(h.rsvp(a.id, event.id), h.rsvp(b.id, event.id));

    let mut admissions = vec![admission_of(&first), admission_of(&second)];
    admissions.sort_by_key(|a| matches!(a, Admission::Waitlist));
    assert_eq!(admissions, vec![Admission::Seat, Admission::Waitlist]);
    assert_eq!(h.seated(event.id).await, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_requests_never_exceed_the_seat_limit() {
    let h = Harness::new();
    let event = h.event(10).await;
    let mut users = Vec::new();
    for n in 0..50 {
        users.push(h.user(n).await);
    }

    let outcomes = futures::future::join_all(users.iter().map(|u| {
        let store = Arc::clone(&h.store);
        let (user_id, event_id) = (u.id, event.id);
        async move { rsvp(&store, user_id, event_id).await }
    }))
    .await;

    let seats = outcomes.iter().filter(|o| admission_of(o) == Admission::Seat).count();
    assert_eq!(seats, 10);
    assert_eq!(h.seated(event.id).await, 10);

    let rsvps = h.repos.rsvps.list_for_event(event.id).await.unwrap();
    assert_eq!(rsvps.len(), 50);
    assert_eq!(rsvps.iter().filter(|r| r.is_waitlisted()).count(), 40);
}

// The attendee's own confirmed row counts against the limit, so only the
// first of the repeated requests gets the seat.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn repeated_requests_from_one_user_keep_one_row() {
    let h = Harness::new();
    let event = h.event(1).await;
    let user = h.user(1).await;

    let outcomes = futures::future::join_all((0..5).map(|_| {
        let store = Arc::clone(&h.store);
        let (user_id, event_id) = (user.id, event.id);
        async move { rsvp(&store, user_id, event_id).await }
    }))
    .await;

    let seats = outcomes.iter().filter(|o| admission_of(o) == Admission::Seat).count();
    assert_eq!(seats, 1);
    let rsvps = h.repos.rsvps.list_for_event(event.id).await.unwrap();
    assert_eq!(rsvps.len(), 1);
    assert!(rsvps[0].is_waitlisted());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn cancelled_seat_is_not_handed_to_the_waitlist() {
    let h = Harness::new();
    let event = h.event(2).await;
    let a = h.user(1).await;
    let b = h.user(2).await;
    let c = h.user(3).await;

    assert_eq!(admission_of(&h.rsvp(a.id, event.id).await), Admission::Seat);
    assert_eq!(admission_of(&h.rsvp(b.id, event.id).await), Admission::Seat);
    assert_eq!(admission_of(&h.rsvp(c.id, event.id).await), Admission::Waitlist);

    assert_eq!(cancelled_count(&h.cancel(a.id, event.id).await), 1);

    let c_row = h.repos.rsvps.find(c.id, event.id).await.unwrap().unwrap();
    assert!(c_row.is_waitlisted());
    assert_eq!(h.seated(event.id).await, 1);

    // B and the waitlisted C still fill the limit of two.
    let d = h.user(4).await;
    assert_eq!(admission_of(&h.rsvp(d.id, event.id).await), Admission::Waitlist);
    assert_eq!(h.seated(event.id).await, 1);
}

#[tokio::test]
async fn cancelling_without_an_rsvp_succeeds_with_a_zero_count() {
    let h = Harness::new();
    let event = h.event(5).await;
    let user = h.user(1).await;

    assert_eq!(cancelled_count(&h.cancel(user.id, event.id).await), 0);
}

#[tokio::test]
async fn cancelling_twice_matches_the_same_row() {
    let h = Harness::new();
    let event = h.event(5).await;
    let user = h.user(1).await;
    admission_of(&h.rsvp(user.id, event.id).await);

    assert_eq!(cancelled_count(&h.cancel(user.id, event.id).await), 1);
    assert_eq!(cancelled_count(&h.cancel(user.id, event.id).await), 1);
    assert_eq!(h.seated(event.id).await, 0);
}

#[tokio::test]
async fn confirmation_email_is_sent_after_admission() {
    let h = Harness::new();
    let event = h.event(0).await;
    let user = h.user(1).await;

    assert_eq!(admission_of(&h.rsvp(user.id, event.id).await), Admission::Waitlist);
    h.store.settle(WAIT).await.unwrap();

    let sent = h.mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, user.email);
}

#[tokio::test]
async fn failing_mailer_does_not_fail_the_rsvp() {
    let h = Harness::with(RecordingMailer::failing(), |rsvps| rsvps);
    let event = h.event(3).await;
    let user = h.user(1).await;

    assert_eq!(admission_of(&h.rsvp(user.id, event.id).await), Admission::Seat);
    h.store.settle(WAIT).await.unwrap();

    assert!(h.mailer.sent().is_empty());
    assert_eq!(h.seated(event.id).await, 1);
}

#[tokio::test]
async fn failed_write_reloads_the_ledger_and_keeps_the_limit() {
    let failing = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&failing);
    let h = Harness::with(RecordingMailer::new(), move |inner| {
        Arc::new(FlakyRsvps { inner, failing: flag }) as Arc<dyn RsvpRepository>
    });
    let event = h.event(2).await;
    let (a, b, c) = (h.user(1).await, h.user(2).await, h.user(3).await);

    assert_eq!(admission_of(&h.rsvp(a.id, event.id).await), Admission::Seat);

    failing.store(true, Ordering::SeqCst);
    let outcome = h.rsvp(b.id, event.id).await;
    assert!(matches!(outcome, RsvpAction::RsvpPersistFailed { .. }));
    assert!(h.store.state(|s| s.ledger(&event.id).is_none()).await);
    failing.store(false, Ordering::SeqCst);

    // B's seat never landed, so the reloaded ledger has room for C.
    assert_eq!(admission_of(&h.rsvp(c.id, event.id).await), Admission::Seat);
    assert_eq!(admission_of(&h.rsvp(b.id, event.id).await), Admission::Waitlist);
    assert_eq!(h.seated(event.id).await, 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn event_cancellation_and_rsvp_never_interleave() {
    let h = Harness::new();
    let event = h.event(5).await;
    let (early, racer, late) = (h.user(1).await, h.user(2).await, h.user(3).await);
    // Warm the ledger with the published event.
    assert_eq!(admission_of(&h.rsvp(early.id, event.id).await), Admission::Seat);

    let mut cancelled = event.clone();
    cancelled.status = EventStatus::Cancelled;
    let (written, raced) = tokio::join!(
        h.write(EventChange::Update(cancelled)),
        h.rsvp(racer.id, event.id)
    );

    assert!(matches!(written, RsvpAction::EventWritten { event: Some(ref e), .. } if e.is_cancelled()));
    match raced {
        // Admitted before the write started, so the write saw its row.
        RsvpAction::RsvpRecorded { .. } => {
            assert!(h.repos.rsvps.find(racer.id, event.id).await.unwrap().is_some());
        },
        RsvpAction::RsvpRejected { reason, .. } => assert_eq!(reason, Rejection::EventCancelled),
        other => panic!("unexpected outcome {other:?}"),
    }

    let outcome = h.rsvp(late.id, event.id).await;
    assert!(matches!(outcome, RsvpAction::RsvpRejected { reason: Rejection::EventCancelled, .. }));
    assert!(h.repos.rsvps.find(late.id, event.id).await.unwrap().is_none());
}

#[tokio::test]
async fn deleted_event_refuses_rsvps() {
    let h = Harness::new();
    let event = h.event(5).await;
    let user = h.user(1).await;
    admission_of(&h.rsvp(user.id, event.id).await);

    let written = h.write(EventChange::Delete(event.id)).await;
    assert!(matches!(written, RsvpAction::EventWritten { event: None, .. }));
    assert_eq!(h.store.state(|s| s.cached_ledgers()).await, 0);

    let outcome = h.rsvp(user.id, event.id).await;
    assert!(matches!(outcome, RsvpAction::RsvpRejected { reason: Rejection::EventNotFound, .. }));
    assert!(h.repos.rsvps.list_for_event(event.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn writing_a_missing_event_fails_without_holding_admissions() {
    let h = Harness::new();
    let event = h.event(5).await;
    let user = h.user(1).await;

    let written = h.write(EventChange::Delete(EventId::new())).await;
    assert!(matches!(written, RsvpAction::EventWriteFailed { reason: Rejection::EventNotFound, .. }));

    assert_eq!(admission_of(&h.rsvp(user.id, event.id).await), Admission::Seat);
}
