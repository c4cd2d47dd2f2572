//! Persistence for Eventure.
//!
//! One `#[async_trait]` repository trait per record kind. Two backends
//! implement all of them: [`MemoryStore`] for tests and database-less runs,
//! and [`PostgresStore`] on `sqlx`. Handlers and the admission environment
//! hold the traits behind `Arc<dyn ..>` through [`Repositories`].

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

use crate::error::RepositoryError;
use crate::types::{
    Category, CategoryId, Club, ClubId, Event, EventId, Location, LocationId, Membership,
    MembershipId, MembershipRole, Rsvp, User, UserId,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Repository result alias.
pub type RepoResult<T> = Result<T, RepositoryError>;

/// Registered accounts.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a user; fails with `Conflict` when the email is taken.
    async fn create(&self, user: User) -> RepoResult<User>;
    /// Look up by id.
    async fn find_by_id(&self, id: UserId) -> RepoResult<Option<User>>;
    /// Look up by (lower-cased) email.
    async fn find_by_email(&self, email: &str) -> RepoResult<Option<User>>;
    /// All users, oldest first.
    async fn list(&self) -> RepoResult<Vec<User>>;
    /// Remove a user together with their RSVPs and memberships.
    async fn delete(&self, id: UserId) -> RepoResult<()>;
}

/// Events.
#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Insert an event.
    async fn create(&self, event: Event) -> RepoResult<Event>;
    /// Look up by id.
    async fn find_by_id(&self, id: EventId) -> RepoResult<Option<Event>>;
    /// All events ordered by date and start time.
    async fn list(&self) -> RepoResult<Vec<Event>>;
    /// Replace every mutable field of an existing event.
    async fn update(&self, event: Event) -> RepoResult<Event>;
    /// Remove an event and its RSVPs.
    async fn delete(&self, id: EventId) -> RepoResult<()>;
}

/// RSVPs, unique per `(user, event)`.
#[async_trait]
pub trait RsvpRepository: Send + Sync {
    /// Insert or overwrite the RSVP for `(rsvp.user_id, rsvp.event_id)`.
    ///
    /// An existing row keeps its id and `created_at`.
    async fn upsert(&self, rsvp: Rsvp) -> RepoResult<Rsvp>;
    /// The RSVP of one user for one event.
    async fn find(&self, user_id: UserId, event_id: EventId) -> RepoResult<Option<Rsvp>>;
    /// Every RSVP for an event, oldest first.
    async fn list_for_event(&self, event_id: EventId) -> RepoResult<Vec<Rsvp>>;
    /// Every RSVP of a user, newest first.
    async fn list_for_user(&self, user_id: UserId) -> RepoResult<Vec<Rsvp>>;
    /// Mark the user's RSVP for the event cancelled, whatever its status.
    ///
    /// Returns the number of rows matched; zero when the user never RSVPed.
    async fn cancel(&self, user_id: UserId, event_id: EventId, at: DateTime<Utc>)
        -> RepoResult<u64>;
}

/// Event categories.
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    /// Insert; fails with `Conflict` on a duplicate name.
    async fn create(&self, category: Category) -> RepoResult<Category>;
    /// Look up by id.
    async fn find_by_id(&self, id: CategoryId) -> RepoResult<Option<Category>>;
    /// All categories by name.
    async fn list(&self) -> RepoResult<Vec<Category>>;
    /// Remove; events keep running without a category.
    async fn delete(&self, id: CategoryId) -> RepoResult<()>;
}

/// Venues.
#[async_trait]
pub trait LocationRepository: Send + Sync {
    /// Insert.
    async fn create(&self, location: Location) -> RepoResult<Location>;
    /// Look up by id.
    async fn find_by_id(&self, id: LocationId) -> RepoResult<Option<Location>>;
    /// All locations by name.
    async fn list(&self) -> RepoResult<Vec<Location>>;
    /// Remove; events keep running without a location.
    async fn delete(&self, id: LocationId) -> RepoResult<()>;
}

/// A club with its member count.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClubSummary {
    /// The club
    pub club: Club,
    /// Number of memberships
    pub member_count: u64,
}

/// Student clubs.
#[async_trait]
pub trait ClubRepository: Send + Sync {
    /// Insert; fails with `Conflict` on a duplicate name.
    async fn create(&self, club: Club) -> RepoResult<Club>;
    /// Look up by id.
    async fn find_by_id(&self, id: ClubId) -> RepoResult<Option<Club>>;
    /// All clubs by name with member counts.
    async fn list(&self) -> RepoResult<Vec<ClubSummary>>;
    /// Remove a club and its memberships.
    async fn delete(&self, id: ClubId) -> RepoResult<()>;
}

/// Club memberships, unique per `(user, club)`.
#[async_trait]
pub trait MembershipRepository: Send + Sync {
    /// Insert; fails with `Conflict` when the user already belongs to the club.
    async fn create(&self, membership: Membership) -> RepoResult<Membership>;
    /// Look up by id.
    async fn find_by_id(&self, id: MembershipId) -> RepoResult<Option<Membership>>;
    /// All memberships, newest first.
    async fn list(&self) -> RepoResult<Vec<Membership>>;
    /// Memberships of one user.
    async fn list_for_user(&self, user_id: UserId) -> RepoResult<Vec<Membership>>;
    /// Memberships of one club.
    async fn list_for_club(&self, club_id: ClubId) -> RepoResult<Vec<Membership>>;
    /// Change the role inside the club.
    async fn update_role(&self, id: MembershipId, role: MembershipRole) -> RepoResult<Membership>;
    /// Remove.
    async fn delete(&self, id: MembershipId) -> RepoResult<()>;
}

/// Readiness check for the backing store.
#[async_trait]
pub trait HealthCheck: Send + Sync {
    /// Succeeds when the store can serve queries.
    async fn ping(&self) -> RepoResult<()>;
}

/// Every repository, shared by handlers and the admission environment.
#[derive(Clone)]
pub struct Repositories {
    /// Users
    pub users: Arc<dyn UserRepository>,
    /// Events
    pub events: Arc<dyn EventRepository>,
    /// RSVPs
    pub rsvps: Arc<dyn RsvpRepository>,
    /// Categories
    pub categories: Arc<dyn CategoryRepository>,
    /// Locations
    pub locations: Arc<dyn LocationRepository>,
    /// Clubs
    pub clubs: Arc<dyn ClubRepository>,
    /// Memberships
    pub memberships: Arc<dyn MembershipRepository>,
    /// Readiness
    pub health: Arc<dyn HealthCheck>,
}

impl Repositories {
    /// Wire every repository to one backend.
    pub fn from_backend<B>(backend: Arc<B>) -> Self
    where
        B: UserRepository
            + EventRepository
            + RsvpRepository
            + CategoryRepository
            + LocationRepository
            + ClubRepository
            + MembershipRepository
            + HealthCheck
            + 'static,
    {
        Self {
            users: backend.clone(),
            events: backend.clone(),
            rsvps: backend.clone(),
            categories: backend.clone(),
            locations: backend.clone(),
            clubs: backend.clone(),
            memberships: backend.clone(),
            health: backend,
        }
    }

    /// In-memory repositories.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_backend(Arc::new(MemoryStore::new()))
    }
}

impl std::fmt::Debug for Repositories {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repositories").finish_non_exhaustive()
    }
}
