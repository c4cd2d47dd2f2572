//! `PostgreSQL` repositories on `sqlx`.
//!
//! Rows are read into `FromRow` structs and converted to domain types. Enum
//! columns are stored as their lowercase (or uppercase, for membership roles)
//! strings.

use super::{
    CategoryRepository, ClubRepository, ClubSummary, EventRepository, HealthCheck,
    LocationRepository, MembershipRepository, RepoResult, RsvpRepository, UserRepository,
};
use crate::error::RepositoryError;
use crate::types::{
    Category, CategoryId, Club, ClubId, Event, EventId, Location, LocationId, Membership,
    MembershipId, MembershipRole, Rsvp, RsvpId, RsvpStatus, User, UserId,
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::time::Duration;
use uuid::Uuid;

/// `PostgreSQL` backend for every repository trait.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Wrap an existing pool.
    #[must_use]
    pub const fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect and run pending migrations.
    ///
    /// # Errors
    ///
    /// Returns error if the connection or a migration fails.
    pub async fn connect(
        url: &str,
        max_connections: u32,
        connect_timeout: Duration,
    ) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(connect_timeout)
            .connect(url)
            .await?;

        tracing::info!("Running database migrations...");
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Database migrations complete");

        Ok(Self::from_pool(pool))
    }

    /// The underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn decode_error(column: &str, error: impl std::fmt::Display) -> RepositoryError {
    RepositoryError::Storage(format!("invalid {column} column: {error}"))
}

fn to_count(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

fn from_count(column: &str, value: i32) -> RepoResult<u32> {
    u32::try_from(value).map_err(|e| decode_error(column, e))
}

/// Map a unique violation to a friendlier conflict message.
fn conflict_as(message: &str) -> impl FnOnce(sqlx::Error) -> RepositoryError + '_ {
    move |error| match RepositoryError::from(error) {
        RepositoryError::Conflict(_) => RepositoryError::Conflict(message.to_string()),
        other => other,
    }
}

/// Map a foreign key violation to a missing parent record.
fn missing_parent(resource: &'static str, id: impl ToString) -> impl FnOnce(sqlx::Error) -> RepositoryError {
    let id = id.to_string();
    move |error| match &error {
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
            RepositoryError::NotFound { resource, id }
        },
        _ => RepositoryError::from(error),
    }
}

// ============================================================================
// Rows
// ============================================================================

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    email: String,
    password_hash: String,
    role: String,
    phone_number: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: UserId::from_uuid(row.id),
            name: row.name,
            email: row.email,
            password_hash: row.password_hash,
            role: row.role.parse().map_err(|e| decode_error("role", e))?,
            phone_number: row.phone_number,
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct EventRow {
    id: Uuid,
    title: String,
    description: Option<String>,
    date: NaiveDate,
    start_time: NaiveTime,
    end_time: NaiveTime,
    seat_limit: i32,
    status: String,
    category_id: Option<Uuid>,
    location_id: Option<Uuid>,
    club_id: Option<Uuid>,
    banner_image: Option<String>,
    created_by: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<EventRow> for Event {
    type Error = RepositoryError;

    fn try_from(row: EventRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: EventId::from_uuid(row.id),
            title: row.title,
            description: row.description,
            date: row.date,
            start_time: row.start_time,
            end_time: row.end_time,
            seat_limit: from_count("seat_limit", row.seat_limit)?,
            status: row.status.parse().map_err(|e| decode_error("status", e))?,
            category_id: row.category_id.map(CategoryId::from_uuid),
            location_id: row.location_id.map(LocationId::from_uuid),
            club_id: row.club_id.map(ClubId::from_uuid),
            banner_image: row.banner_image,
            created_by: row.created_by.map(UserId::from_uuid),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct RsvpRow {
    id: Uuid,
    user_id: Uuid,
    event_id: Uuid,
    status: String,
    waitlist: bool,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<RsvpRow> for Rsvp {
    type Error = RepositoryError;

    fn try_from(row: RsvpRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: RsvpId::from_uuid(row.id),
            user_id: UserId::from_uuid(row.user_id),
            event_id: EventId::from_uuid(row.event_id),
            status: row.status.parse().map_err(|e| decode_error("status", e))?,
            waitlist: row.waitlist,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct MembershipRow {
    id: Uuid,
    user_id: Uuid,
    club_id: Uuid,
    role: String,
    joined_at: DateTime<Utc>,
}

impl TryFrom<MembershipRow> for Membership {
    type Error = RepositoryError;

    fn try_from(row: MembershipRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: MembershipId::from_uuid(row.id),
            user_id: UserId::from_uuid(row.user_id),
            club_id: ClubId::from_uuid(row.club_id),
            role: row.role.parse().map_err(|e| decode_error("role", e))?,
            joined_at: row.joined_at,
        })
    }
}

fn convert_all<R, T>(rows: Vec<R>) -> RepoResult<Vec<T>>
where
    T: TryFrom<R, Error = RepositoryError>,
{
    rows.into_iter().map(T::try_from).collect()
}

const USER_COLUMNS: &str = "id, name, email, password_hash, role, phone_number, created_at";
const EVENT_COLUMNS: &str = "id, title, description, date, start_time, end_time, seat_limit, \
     status, category_id, location_id, club_id, banner_image, created_by, created_at, updated_at";
const RSVP_COLUMNS: &str = "id, user_id, event_id, status, waitlist, notes, created_at, updated_at";
const MEMBERSHIP_COLUMNS: &str = "id, user_id, club_id, role, joined_at";

// ============================================================================
// Users
// ============================================================================

#[async_trait]
impl UserRepository for PostgresStore {
    async fn create(&self, user: User) -> RepoResult<User> {
        sqlx::query(
            "INSERT INTO users (id, name, email, password_hash, role, phone_number, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(user.id.as_uuid())
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(&user.phone_number)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(conflict_as("User already exists"))?;
        Ok(user)
    }

    async fn find_by_id(&self, id: UserId) -> RepoResult<Option<User>> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await?;
        row.map(User::try_from).transpose()
    }

    async fn find_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
                .bind(email)
                .fetch_optional(&self.pool)
                .await?;
        row.map(User::try_from).transpose()
    }

    async fn list(&self) -> RepoResult<Vec<User>> {
        let rows: Vec<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at"))
                .fetch_all(&self.pool)
                .await?;
        convert_all(rows)
    }

    async fn delete(&self, id: UserId) -> RepoResult<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::not_found("User", id));
        }
        Ok(())
    }
}

// ============================================================================
// Events
// ============================================================================

#[async_trait]
impl EventRepository for PostgresStore {
    async fn create(&self, event: Event) -> RepoResult<Event> {
        sqlx::query(
            "INSERT INTO events (id, title, description, date, start_time, end_time, seat_limit,
                 status, category_id, location_id, club_id, banner_image, created_by,
                 created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)",
        )
        .bind(event.id.as_uuid())
        .bind(&event.title)
        .bind(&event.description)
        .bind(event.date)
        .bind(event.start_time)
        .bind(event.end_time)
        .bind(to_count(event.seat_limit))
        .bind(event.status.as_str())
        .bind(event.category_id.map(|id| *id.as_uuid()))
        .bind(event.location_id.map(|id| *id.as_uuid()))
        .bind(event.club_id.map(|id| *id.as_uuid()))
        .bind(&event.banner_image)
        .bind(event.created_by.map(|id| *id.as_uuid()))
        .bind(event.created_at)
        .bind(event.updated_at)
        .execute(&self.pool)
        .await
        .map_err(missing_parent("Category, location or club", event.id))?;
        Ok(event)
    }

    async fn find_by_id(&self, id: EventId) -> RepoResult<Option<Event>> {
        let row: Option<EventRow> =
            sqlx::query_as(&format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = $1"))
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await?;
        row.map(Event::try_from).transpose()
    }

    async fn list(&self) -> RepoResult<Vec<Event>> {
        let rows: Vec<EventRow> = sqlx::query_as(&format!(
            "SELECT {EVENT_COLUMNS} FROM events ORDER BY date, start_time, created_at"
        ))
        .fetch_all(&self.pool)
        .await?;
        convert_all(rows)
    }

    async fn update(&self, event: Event) -> RepoResult<Event> {
        let result = sqlx::query(
            "UPDATE events SET title = $2, description = $3, date = $4, start_time = $5,
                 end_time = $6, seat_limit = $7, status = $8, category_id = $9,
                 location_id = $10, club_id = $11, banner_image = $12, updated_at = $13
             WHERE id = $1",
        )
        .bind(event.id.as_uuid())
        .bind(&event.title)
        .bind(&event.description)
        .bind(event.date)
        .bind(event.start_time)
        .bind(event.end_time)
        .bind(to_count(event.seat_limit))
        .bind(event.status.as_str())
        .bind(event.category_id.map(|id| *id.as_uuid()))
        .bind(event.location_id.map(|id| *id.as_uuid()))
        .bind(event.club_id.map(|id| *id.as_uuid()))
        .bind(&event.banner_image)
        .bind(event.updated_at)
        .execute(&self.pool)
        .await
        .map_err(missing_parent("Category, location or club", event.id))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::not_found("Event", event.id));
        }
        Ok(event)
    }

    async fn delete(&self, id: EventId) -> RepoResult<()> {
        // RSVPs go with the event through ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::not_found("Event", id));
        }
        Ok(())
    }
}

// ============================================================================
// RSVPs
// ============================================================================

#[async_trait]
impl RsvpRepository for PostgresStore {
    async fn upsert(&self, rsvp: Rsvp) -> RepoResult<Rsvp> {
        let row: RsvpRow = sqlx::query_as(&format!(
            "INSERT INTO rsvps (id, user_id, event_id, status, waitlist, notes, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             ON CONFLICT (user_id, event_id) DO UPDATE SET
                status = EXCLUDED.status,
                waitlist = EXCLUDED.waitlist,
                notes = EXCLUDED.notes,
                updated_at = EXCLUDED.updated_at
             RETURNING {RSVP_COLUMNS}"
        ))
        .bind(rsvp.id.as_uuid())
        .bind(rsvp.user_id.as_uuid())
        .bind(rsvp.event_id.as_uuid())
        .bind(rsvp.status.as_str())
        .bind(rsvp.waitlist)
        .bind(&rsvp.notes)
        .bind(rsvp.created_at)
        .bind(rsvp.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(missing_parent("Event", rsvp.event_id))?;
        Rsvp::try_from(row)
    }

    async fn find(&self, user_id: UserId, event_id: EventId) -> RepoResult<Option<Rsvp>> {
        let row: Option<RsvpRow> = sqlx::query_as(&format!(
            "SELECT {RSVP_COLUMNS} FROM rsvps WHERE user_id = $1 AND event_id = $2"
        ))
        .bind(user_id.as_uuid())
        .bind(event_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;
        row.map(Rsvp::try_from).transpose()
    }

    async fn list_for_event(&self, event_id: EventId) -> RepoResult<Vec<Rsvp>> {
        let rows: Vec<RsvpRow> = sqlx::query_as(&format!(
            "SELECT {RSVP_COLUMNS} FROM rsvps WHERE event_id = $1 ORDER BY created_at"
        ))
        .bind(event_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;
        convert_all(rows)
    }

    async fn list_for_user(&self, user_id: UserId) -> RepoResult<Vec<Rsvp>> {
        let rows: Vec<RsvpRow> = sqlx::query_as(&format!(
            "SELECT {RSVP_COLUMNS} FROM rsvps WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;
        convert_all(rows)
    }

    async fn cancel(&self, user_id: UserId, event_id: EventId, at: DateTime<Utc>) -> RepoResult<u64> {
        let result = sqlx::query(
            "UPDATE rsvps SET status = $3, updated_at = $4
             WHERE user_id = $1 AND event_id = $2",
        )
        .bind(user_id.as_uuid())
        .bind(event_id.as_uuid())
        .bind(RsvpStatus::Cancelled.as_str())
        .bind(at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}

// ============================================================================
// Catalog
// ============================================================================

#[async_trait]
impl CategoryRepository for PostgresStore {
    async fn create(&self, category: Category) -> RepoResult<Category> {
        sqlx::query("INSERT INTO categories (id, name, description, created_at) VALUES ($1, $2, $3, $4)")
            .bind(category.id.as_uuid())
            .bind(&category.name)
            .bind(&category.description)
            .bind(category.created_at)
            .execute(&self.pool)
            .await
            .map_err(conflict_as("Category already exists"))?;
        Ok(category)
    }

    async fn find_by_id(&self, id: CategoryId) -> RepoResult<Option<Category>> {
        let row: Option<(Uuid, String, Option<String>, DateTime<Utc>)> = sqlx::query_as(
            "SELECT id, name, description, created_at FROM categories WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|(id, name, description, created_at)| Category {
            id: CategoryId::from_uuid(id),
            name,
            description,
            created_at,
        }))
    }

    async fn list(&self) -> RepoResult<Vec<Category>> {
        let rows: Vec<(Uuid, String, Option<String>, DateTime<Utc>)> =
            sqlx::query_as("SELECT id, name, description, created_at FROM categories ORDER BY name")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows
            .into_iter()
            .map(|(id, name, description, created_at)| Category {
                id: CategoryId::from_uuid(id),
                name,
                description,
                created_at,
            })
            .collect())
    }

    async fn delete(&self, id: CategoryId) -> RepoResult<()> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::not_found("Category", id));
        }
        Ok(())
    }
}

type LocationTuple = (Uuid, String, Option<String>, Option<i32>, DateTime<Utc>);

fn location_from(row: LocationTuple) -> RepoResult<Location> {
    let (id, name, description, capacity, created_at) = row;
    Ok(Location {
        id: LocationId::from_uuid(id),
        name,
        description,
        capacity: capacity.map(|c| from_count("capacity", c)).transpose()?,
        created_at,
    })
}

#[async_trait]
impl LocationRepository for PostgresStore {
    async fn create(&self, location: Location) -> RepoResult<Location> {
        sqlx::query(
            "INSERT INTO locations (id, name, description, capacity, created_at)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(location.id.as_uuid())
        .bind(&location.name)
        .bind(&location.description)
        .bind(location.capacity.map(to_count))
        .bind(location.created_at)
        .execute(&self.pool)
        .await?;
        Ok(location)
    }

    async fn find_by_id(&self, id: LocationId) -> RepoResult<Option<Location>> {
        let row: Option<LocationTuple> = sqlx::query_as(
            "SELECT id, name, description, capacity, created_at FROM locations WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;
        row.map(location_from).transpose()
    }

    async fn list(&self) -> RepoResult<Vec<Location>> {
        let rows: Vec<LocationTuple> = sqlx::query_as(
            "SELECT id, name, description, capacity, created_at FROM locations ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(location_from).collect()
    }

    async fn delete(&self, id: LocationId) -> RepoResult<()> {
        let result = sqlx::query("DELETE FROM locations WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::not_found("Location", id));
        }
        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct ClubRow {
    id: Uuid,
    name: String,
    description: Option<String>,
    contact_email: Option<String>,
    logo: Option<String>,
    created_by: Option<Uuid>,
    created_at: DateTime<Utc>,
}

impl From<ClubRow> for Club {
    fn from(row: ClubRow) -> Self {
        Self {
            id: ClubId::from_uuid(row.id),
            name: row.name,
            description: row.description,
            contact_email: row.contact_email,
            logo: row.logo,
            created_by: row.created_by.map(UserId::from_uuid),
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl ClubRepository for PostgresStore {
    async fn create(&self, club: Club) -> RepoResult<Club> {
        sqlx::query(
            "INSERT INTO clubs (id, name, description, contact_email, logo, created_by, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(club.id.as_uuid())
        .bind(&club.name)
        .bind(&club.description)
        .bind(&club.contact_email)
        .bind(&club.logo)
        .bind(club.created_by.map(|id| *id.as_uuid()))
        .bind(club.created_at)
        .execute(&self.pool)
        .await
        .map_err(conflict_as("Club already exists"))?;
        Ok(club)
    }

    async fn find_by_id(&self, id: ClubId) -> RepoResult<Option<Club>> {
        let row: Option<ClubRow> = sqlx::query_as(
            "SELECT id, name, description, contact_email, logo, created_by, created_at
             FROM clubs WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Club::from))
    }

    async fn list(&self) -> RepoResult<Vec<ClubSummary>> {
        let rows: Vec<(Uuid, i64)> = sqlx::query_as(
            "SELECT c.id, COUNT(m.id) FROM clubs c
             LEFT JOIN memberships m ON m.club_id = c.id
             GROUP BY c.id",
        )
        .fetch_all(&self.pool)
        .await?;
        let clubs: Vec<ClubRow> = sqlx::query_as(
            "SELECT id, name, description, contact_email, logo, created_by, created_at
             FROM clubs ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(clubs
            .into_iter()
            .map(|row| {
                let member_count = rows
                    .iter()
                    .find(|(id, _)| *id == row.id)
                    .map_or(0, |(_, count)| u64::try_from(*count).unwrap_or(0));
                ClubSummary { club: row.into(), member_count }
            })
            .collect())
    }

    async fn delete(&self, id: ClubId) -> RepoResult<()> {
        let result = sqlx::query("DELETE FROM clubs WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::not_found("Club", id));
        }
        Ok(())
    }
}

// ============================================================================
// Memberships
// ============================================================================

#[async_trait]
impl MembershipRepository for PostgresStore {
    async fn create(&self, membership: Membership) -> RepoResult<Membership> {
        sqlx::query(
            "INSERT INTO memberships (id, user_id, club_id, role, joined_at)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(membership.id.as_uuid())
        .bind(membership.user_id.as_uuid())
        .bind(membership.club_id.as_uuid())
        .bind(membership.role.as_str())
        .bind(membership.joined_at)
        .execute(&self.pool)
        .await
        .map_err(|error| match &error {
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                RepositoryError::not_found("User or club", membership.club_id)
            },
            _ => conflict_as("User is already a member of this club")(error),
        })?;
        Ok(membership)
    }

    async fn find_by_id(&self, id: MembershipId) -> RepoResult<Option<Membership>> {
        let row: Option<MembershipRow> = sqlx::query_as(&format!(
            "SELECT {MEMBERSHIP_COLUMNS} FROM memberships WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;
        row.map(Membership::try_from).transpose()
    }

    async fn list(&self) -> RepoResult<Vec<Membership>> {
        let rows: Vec<MembershipRow> = sqlx::query_as(&format!(
            "SELECT {MEMBERSHIP_COLUMNS} FROM memberships ORDER BY joined_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        convert_all(rows)
    }

    async fn list_for_user(&self, user_id: UserId) -> RepoResult<Vec<Membership>> {
        let rows: Vec<MembershipRow> = sqlx::query_as(&format!(
            "SELECT {MEMBERSHIP_COLUMNS} FROM memberships WHERE user_id = $1 ORDER BY joined_at DESC"
        ))
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;
        convert_all(rows)
    }

    async fn list_for_club(&self, club_id: ClubId) -> RepoResult<Vec<Membership>> {
        let rows: Vec<MembershipRow> = sqlx::query_as(&format!(
            "SELECT {MEMBERSHIP_COLUMNS} FROM memberships WHERE club_id = $1 ORDER BY joined_at DESC"
        ))
        .bind(club_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;
        convert_all(rows)
    }

    async fn update_role(&self, id: MembershipId, role: MembershipRole) -> RepoResult<Membership> {
        let row: Option<MembershipRow> = sqlx::query_as(&format!(
            "UPDATE memberships SET role = $2 WHERE id = $1 RETURNING {MEMBERSHIP_COLUMNS}"
        ))
        .bind(id.as_uuid())
        .bind(role.as_str())
        .fetch_optional(&self.pool)
        .await?;
        row.map(Membership::try_from)
            .transpose()?
            .ok_or_else(|| RepositoryError::not_found("Membership", id))
    }

    async fn delete(&self, id: MembershipId) -> RepoResult<()> {
        let result = sqlx::query("DELETE FROM memberships WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::not_found("Membership", id));
        }
        Ok(())
    }
}

#[async_trait]
impl HealthCheck for PostgresStore {
    async fn ping(&self) -> RepoResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
