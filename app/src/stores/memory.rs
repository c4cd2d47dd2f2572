//! In-memory repositories.
//!
//! All tables live behind one `RwLock`, so cascades and uniqueness checks are
//! atomic. Used by tests and when `DATABASE_URL` is unset.

use super::{
    CategoryRepository, ClubRepository, ClubSummary, EventRepository, HealthCheck,
    LocationRepository, MembershipRepository, RepoResult, RsvpRepository, UserRepository,
};
use crate::error::RepositoryError;
use crate::types::{
    Category, CategoryId, Club, ClubId, Event, EventId, Location, LocationId, Membership,
    MembershipId, MembershipRole, Rsvp, RsvpStatus, User, UserId,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<UserId, User>,
    events: HashMap<EventId, Event>,
    rsvps: HashMap<(UserId, EventId), Rsvp>,
    categories: HashMap<CategoryId, Category>,
    locations: HashMap<LocationId, Location>,
    clubs: HashMap<ClubId, Club>,
    memberships: HashMap<MembershipId, Membership>,
}

/// In-memory backend for every repository trait.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create(&self, user: User) -> RepoResult<User> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(RepositoryError::Conflict("User already exists".to_string()));
        }
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: UserId) -> RepoResult<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn list(&self) -> RepoResult<Vec<User>> {
        let mut users: Vec<User> = self.tables.read().await.users.values().cloned().collect();
        users.sort_by_key(|u| u.created_at);
        Ok(users)
    }

    async fn delete(&self, id: UserId) -> RepoResult<()> {
        let mut tables = self.tables.write().await;
        if tables.users.remove(&id).is_none() {
            return Err(RepositoryError::not_found("User", id));
        }
        tables.rsvps.retain(|(user_id, _), _| *user_id != id);
        tables.memberships.retain(|_, m| m.user_id != id);
        Ok(())
    }
}

#[async_trait]
impl EventRepository for MemoryStore {
    async fn create(&self, event: Event) -> RepoResult<Event> {
        self.tables.write().await.events.insert(event.id, event.clone());
        Ok(event)
    }

    async fn find_by_id(&self, id: EventId) -> RepoResult<Option<Event>> {
        Ok(self.tables.read().await.events.get(&id).cloned())
    }

    async fn list(&self) -> RepoResult<Vec<Event>> {
        let mut events: Vec<Event> = self.tables.read().await.events.values().cloned().collect();
        events.sort_by_key(|e| (e.date, e.start_time, e.created_at));
        Ok(events)
    }

    async fn update(&self, event: Event) -> RepoResult<Event> {
        let mut tables = self.tables.write().await;
        match tables.events.get_mut(&event.id) {
            Some(existing) => {
                *existing = event.clone();
                Ok(event)
            },
            None => Err(RepositoryError::not_found("Event", event.id)),
        }
    }

    async fn delete(&self, id: EventId) -> RepoResult<()> {
        let mut tables = self.tables.write().await;
        if tables.events.remove(&id).is_none() {
            return Err(RepositoryError::not_found("Event", id));
        }
        tables.rsvps.retain(|(_, event_id), _| *event_id != id);
        Ok(())
    }
}

#[async_trait]
impl RsvpRepository for MemoryStore {
    async fn upsert(&self, rsvp: Rsvp) -> RepoResult<Rsvp> {
        let mut tables = self.tables.write().await;
        let stored = match tables.rsvps.get(&(rsvp.user_id, rsvp.event_id)) {
            Some(existing) => Rsvp { id: existing.id, created_at: existing.created_at, ..rsvp },
            None => rsvp,
        };
        tables.rsvps.insert((stored.user_id, stored.event_id), stored.clone());
        Ok(stored)
    }

    async fn find(&self, user_id: UserId, event_id: EventId) -> RepoResult<Option<Rsvp>> {
        Ok(self.tables.read().await.rsvps.get(&(user_id, event_id)).cloned())
    }

    async fn list_for_event(&self, event_id: EventId) -> RepoResult<Vec<Rsvp>> {
        let tables = self.tables.read().await;
        let mut rsvps: Vec<Rsvp> = tables
            .rsvps
            .values()
            .filter(|r| r.event_id == event_id)
            .cloned()
            .collect();
        rsvps.sort_by_key(|r| r.created_at);
        Ok(rsvps)
    }

    async fn list_for_user(&self, user_id: UserId) -> RepoResult<Vec<Rsvp>> {
        let tables = self.tables.read().await;
        let mut rsvps: Vec<Rsvp> = tables
            .rsvps
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        rsvps.sort_by_key(|r| std::cmp::Reverse(r.created_at));
        Ok(rsvps)
    }

    async fn cancel(&self, user_id: UserId, event_id: EventId, at: DateTime<Utc>) -> RepoResult<u64> {
        let mut tables = self.tables.write().await;
        match tables.rsvps.get_mut(&(user_id, event_id)) {
            Some(rsvp) => {
                rsvp.status = RsvpStatus::Cancelled;
                rsvp.updated_at = at;
                Ok(1)
            },
            None => Ok(0),
        }
    }
}

#[async_trait]
impl CategoryRepository for MemoryStore {
    async fn create(&self, category: Category) -> RepoResult<Category> {
        let mut tables = self.tables.write().await;
        if tables.categories.values().any(|c| c.name.eq_ignore_ascii_case(&category.name)) {
            return Err(RepositoryError::Conflict("Category already exists".to_string()));
        }
        tables.categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn find_by_id(&self, id: CategoryId) -> RepoResult<Option<Category>> {
        Ok(self.tables.read().await.categories.get(&id).cloned())
    }

    async fn list(&self) -> RepoResult<Vec<Category>> {
        let mut categories: Vec<Category> =
            self.tables.read().await.categories.values().cloned().collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn delete(&self, id: CategoryId) -> RepoResult<()> {
        let mut tables = self.tables.write().await;
        if tables.categories.remove(&id).is_none() {
            return Err(RepositoryError::not_found("Category", id));
        }
        for event in tables.events.values_mut().filter(|e| e.category_id == Some(id)) {
            event.category_id = None;
        }
        Ok(())
    }
}

#[async_trait]
impl LocationRepository for MemoryStore {
    async fn create(&self, location: Location) -> RepoResult<Location> {
        self.tables.write().await.locations.insert(location.id, location.clone());
        Ok(location)
    }

    async fn find_by_id(&self, id: LocationId) -> RepoResult<Option<Location>> {
        Ok(self.tables.read().await.locations.get(&id).cloned())
    }

    async fn list(&self) -> RepoResult<Vec<Location>> {
        let mut locations: Vec<Location> =
            self.tables.read().await.locations.values().cloned().collect();
        locations.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(locations)
    }

    async fn delete(&self, id: LocationId) -> RepoResult<()> {
        let mut tables = self.tables.write().await;
        if tables.locations.remove(&id).is_none() {
            return Err(RepositoryError::not_found("Location", id));
        }
        for event in tables.events.values_mut().filter(|e| e.location_id == Some(id)) {
            event.location_id = None;
        }
        Ok(())
    }
}

#[async_trait]
impl ClubRepository for MemoryStore {
    async fn create(&self, club: Club) -> RepoResult<Club> {
        let mut tables = self.tables.write().await;
        if tables.clubs.values().any(|c| c.name.eq_ignore_ascii_case(&club.name)) {
            return Err(RepositoryError::Conflict("Club already exists".to_string()));
        }
        tables.clubs.insert(club.id, club.clone());
        Ok(club)
    }

    async fn find_by_id(&self, id: ClubId) -> RepoResult<Option<Club>> {
        Ok(self.tables.read().await.clubs.get(&id).cloned())
    }

    async fn list(&self) -> RepoResult<Vec<ClubSummary>> {
        let tables = self.tables.read().await;
        let mut clubs: Vec<ClubSummary> = tables
            .clubs
            .values()
            .map(|club| ClubSummary {
                club: club.clone(),
                member_count: tables.memberships.values().filter(|m| m.club_id == club.id).count()
                    as u64,
            })
            .collect();
        clubs.sort_by(|a, b| a.club.name.cmp(&b.club.name));
        Ok(clubs)
    }

    async fn delete(&self, id: ClubId) -> RepoResult<()> {
        let mut tables = self.tables.write().await;
        if tables.clubs.remove(&id).is_none() {
            return Err(RepositoryError::not_found("Club", id));
        }
        tables.memberships.retain(|_, m| m.club_id != id);
        for event in tables.events.values_mut().filter(|e| e.club_id == Some(id)) {
            event.club_id = None;
        }
        Ok(())
    }
}

#[async_trait]
impl MembershipRepository for MemoryStore {
    async fn create(&self, membership: Membership) -> RepoResult<Membership> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&membership.user_id) {
            return Err(RepositoryError::not_found("User", membership.user_id));
        }
        if !tables.clubs.contains_key(&membership.club_id) {
            return Err(RepositoryError::not_found("Club", membership.club_id));
        }
        if tables
            .memberships
            .values()
            .any(|m| m.user_id == membership.user_id && m.club_id == membership.club_id)
        {
            return Err(RepositoryError::Conflict("User is already a member of this club".to_string()));
        }
        tables.memberships.insert(membership.id, membership.clone());
        Ok(membership)
    }

    async fn find_by_id(&self, id: MembershipId) -> RepoResult<Option<Membership>> {
        Ok(self.tables.read().await.memberships.get(&id).cloned())
    }

    async fn list(&self) -> RepoResult<Vec<Membership>> {
        let mut memberships: Vec<Membership> =
            self.tables.read().await.memberships.values().cloned().collect();
        memberships.sort_by_key(|m| std::cmp::Reverse(m.joined_at));
        Ok(memberships)
    }

    async fn list_for_user(&self, user_id: UserId) -> RepoResult<Vec<Membership>> {
        let all = MembershipRepository::list(self).await?;
        Ok(all.into_iter().filter(|m| m.user_id == user_id).collect())
    }

    async fn list_for_club(&self, club_id: ClubId) -> RepoResult<Vec<Membership>> {
        let all = MembershipRepository::list(self).await?;
        Ok(all.into_iter().filter(|m| m.club_id == club_id).collect())
    }

    async fn update_role(&self, id: MembershipId, role: MembershipRole) -> RepoResult<Membership> {
        let mut tables = self.tables.write().await;
        let membership = tables
            .memberships
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::not_found("Membership", id))?;
        membership.role = role;
        Ok(membership.clone())
    }

    async fn delete(&self, id: MembershipId) -> RepoResult<()> {
        match self.tables.write().await.memberships.remove(&id) {
            Some(_) => Ok(()),
            None => Err(RepositoryError::not_found("Membership", id)),
        }
    }
}

#[async_trait]
impl HealthCheck for MemoryStore {
    async fn ping(&self) -> RepoResult<()> {
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::stores::Repositories;
    use crate::types::{EventStatus, Role};
    use chrono::{NaiveDate, NaiveTime};
    use std::sync::Arc;

    fn user(email: &str) -> User {
        User {
            id: UserId::new(),
            name: "Test User".to_string(),
            email: email.to_string(),
            password_hash: String::new(),
            role: Role::Attendee,
            phone_number: None,
            created_at: Utc::now(),
        }
    }

    fn event() -> Event {
        let now = Utc::now();
        Event {
            id: EventId::new(),
            title: "Robotics Demo".to_string(),
            description: None,
            date: NaiveDate::from_ymd_opt(2026, 5, 1).unwrap(),
            start_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
            seat_limit: 2,
            status: EventStatus::Published,
            category_id: None,
            location_id: None,
            club_id: None,
            banner_image: None,
            created_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn rsvp(user_id: UserId, event_id: EventId) -> Rsvp {
        let now = Utc::now();
        Rsvp {
            id: crate::types::RsvpId::new(),
            user_id,
            event_id,
            status: RsvpStatus::Confirmed,
            waitlist: false,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict() {
        let repos = Repositories::in_memory();
        repos.users.create(user("ada@campus.edu")).await.unwrap();

        let err = repos.users.create(user("ada@campus.edu")).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn upsert_keeps_identity_of_existing_rsvp() {
        let repos = Repositories::in_memory();
        let (user_id, event_id) = (UserId::new(), EventId::new());

        let first = repos.rsvps.upsert(rsvp(user_id, event_id)).await.unwrap();
        let mut second = rsvp(user_id, event_id);
        second.waitlist = true;
        let stored = repos.rsvps.upsert(second).await.unwrap();

        assert_eq!(stored.id, first.id);
        assert!(stored.waitlist);
        assert_eq!(repos.rsvps.list_for_event(event_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn cancel_matches_the_row_whatever_its_status() {
        let repos = Repositories::in_memory();
        let (user_id, event_id) = (UserId::new(), EventId::new());
        repos.rsvps.upsert(rsvp(user_id, event_id)).await.unwrap();

        assert_eq!(repos.rsvps.cancel(user_id, event_id, Utc::now()).await.unwrap(), 1);
        assert_eq!(repos.rsvps.cancel(user_id, event_id, Utc::now()).await.unwrap(), 1);
        let stored = repos.rsvps.list_for_event(event_id).await.unwrap();
        assert_eq!(stored[0].status, RsvpStatus::Cancelled);
        assert_eq!(repos.rsvps.cancel(UserId::new(), event_id, Utc::now()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn deleting_an_event_removes_its_rsvps() {
        let repos = Repositories::in_memory();
        let event = repos.events.create(event()).await.unwrap();
        repos.rsvps.upsert(rsvp(UserId::new(), event.id)).await.unwrap();

        repos.events.delete(event.id).await.unwrap();

        assert!(repos.rsvps.list_for_event(event.id).await.unwrap().is_empty());
        assert!(matches!(
            repos.events.delete(event.id).await.unwrap_err(),
            RepositoryError::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn club_listing_counts_members() {
        let store = Arc::new(MemoryStore::new());
        let repos = Repositories::from_backend(store);
        let member = repos.users.create(user("grace@campus.edu")).await.unwrap();
        let club = repos
            .clubs
            .create(Club {
                id: ClubId::new(),
                name: "Chess".to_string(),
                description: None,
                contact_email: None,
                logo: None,
                created_by: None,
                created_at: Utc::now(),
            })
            .await
            .unwrap();
        let membership = Membership {
            id: MembershipId::new(),
            user_id: member.id,
            club_id: club.id,
            role: MembershipRole::Member,
            joined_at: Utc::now(),
        };
        repos.memberships.create(membership.clone()).await.unwrap();

        let again = Membership { id: MembershipId::new(), ..membership };
        assert!(matches!(
            repos.memberships.create(again).await.unwrap_err(),
            RepositoryError::Conflict(_)
        ));

        let clubs = repos.clubs.list().await.unwrap();
        assert_eq!(clubs[0].member_count, 1);
    }
}
