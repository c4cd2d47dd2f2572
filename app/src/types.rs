//! Domain types for Eventure.
//!
//! Identifiers, enums and the entities stored by the repositories. JSON
//! field names are camelCase to match the single-page frontend.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(Uuid);

        impl $name {
            #[doc = concat!("Creates a new random `", stringify!($name), "`")]
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            #[doc = concat!("Create a `", stringify!($name), "` from a `Uuid`")]
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Get the inner UUID
            #[must_use]
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }
    };
}

uuid_id!(
    /// Unique identifier for a user
    UserId
);
uuid_id!(
    /// Unique identifier for an event
    EventId
);
uuid_id!(
    /// Unique identifier for an RSVP
    RsvpId
);
uuid_id!(
    /// Unique identifier for an event category
    CategoryId
);
uuid_id!(
    /// Unique identifier for a venue
    LocationId
);
uuid_id!(
    /// Unique identifier for a club
    ClubId
);
uuid_id!(
    /// Unique identifier for a club membership
    MembershipId
);

// ============================================================================
// Enums
// ============================================================================

/// Error for enum values that do not match any variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownVariant {
    /// What was being parsed
    pub kind: &'static str,
    /// The rejected input
    pub value: String,
}

macro_rules! string_enum {
    ($name:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            /// Storage and wire representation
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    other => Err(UnknownVariant { kind: $kind, value: other.to_string() }),
                }
            }
        }
    };
}

/// Account role
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Manages events and the catalog
    Admin,
    /// Browses events and RSVPs
    #[default]
    Attendee,
}

string_enum!(Role, "role", { Admin => "admin", Attendee => "attendee" });

impl Role {
    /// Whether this role may use admin-only routes
    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }
}

/// Event lifecycle
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    /// Not yet visible to attendees
    Draft,
    /// Open for RSVPs
    #[default]
    Published,
    /// Called off; no new RSVPs
    Cancelled,
}

string_enum!(EventStatus, "event status", {
    Draft => "draft",
    Published => "published",
    Cancelled => "cancelled",
});

/// RSVP state
///
/// Over-capacity RSVPs stay `Confirmed` with the waitlist flag set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RsvpStatus {
    /// Active reservation (seat or waitlist)
    Confirmed,
    /// Withdrawn by the attendee
    Cancelled,
}

string_enum!(RsvpStatus, "rsvp status", { Confirmed => "confirmed", Cancelled => "cancelled" });

/// Role inside a club
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MembershipRole {
    /// Regular member
    #[default]
    Member,
    /// Club administrator
    Admin,
    /// Club president
    President,
}

string_enum!(MembershipRole, "membership role", {
    Member => "MEMBER",
    Admin => "ADMIN",
    President => "PRESIDENT",
});

// ============================================================================
// Entities
// ============================================================================

/// Registered account
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Identifier
    pub id: UserId,
    /// Display name
    pub name: String,
    /// Login email, unique
    pub email: String,
    /// Argon2 PHC string, never serialized
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Account role
    pub role: Role,
    /// Optional 11-digit phone number
    pub phone_number: Option<String>,
    /// Registration time
    pub created_at: DateTime<Utc>,
}

/// Campus event
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Identifier
    pub id: EventId,
    /// Title
    pub title: String,
    /// Free-form description
    pub description: Option<String>,
    /// Calendar day
    pub date: NaiveDate,
    /// Start time of day
    pub start_time: NaiveTime,
    /// End time of day
    pub end_time: NaiveTime,
    /// Maximum confirmed, non-waitlisted attendees
    pub seat_limit: u32,
    /// Lifecycle status
    pub status: EventStatus,
    /// Category, if any
    pub category_id: Option<CategoryId>,
    /// Venue, if any
    pub location_id: Option<LocationId>,
    /// Organizing club, if any
    pub club_id: Option<ClubId>,
    /// Banner image URL
    pub banner_image: Option<String>,
    /// Admin who created the event
    pub created_by: Option<UserId>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

impl Event {
    /// Whether new RSVPs are refused
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self.status, EventStatus::Cancelled)
    }
}

/// A user's reservation for an event; unique per (user, event)
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Rsvp {
    /// Identifier
    pub id: RsvpId,
    /// Attendee
    pub user_id: UserId,
    /// Event
    pub event_id: EventId,
    /// Confirmed or cancelled
    pub status: RsvpStatus,
    /// Over-capacity flag
    pub waitlist: bool,
    /// Attendee notes
    pub notes: Option<String>,
    /// First RSVP time
    pub created_at: DateTime<Utc>,
    /// Last change time
    pub updated_at: DateTime<Utc>,
}

impl Rsvp {
    /// Confirmed and not on the waitlist
    #[must_use]
    pub const fn holds_seat(&self) -> bool {
        matches!(self.status, RsvpStatus::Confirmed) && !self.waitlist
    }

    /// Confirmed but on the waitlist
    #[must_use]
    pub const fn is_waitlisted(&self) -> bool {
        matches!(self.status, RsvpStatus::Confirmed) && self.waitlist
    }
}

/// Event category
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    /// Identifier
    pub id: CategoryId,
    /// Unique name
    pub name: String,
    /// Description
    pub description: Option<String>,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

/// Venue
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    /// Identifier
    pub id: LocationId,
    /// Name
    pub name: String,
    /// Description
    pub description: Option<String>,
    /// Room capacity, informational
    pub capacity: Option<u32>,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

/// Student club
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Club {
    /// Identifier
    pub id: ClubId,
    /// Unique name
    pub name: String,
    /// Description
    pub description: Option<String>,
    /// Contact address
    pub contact_email: Option<String>,
    /// Logo URL
    pub logo: Option<String>,
    /// Admin who created the club
    pub created_by: Option<UserId>,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

/// Club membership; unique per (user, club)
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Membership {
    /// Identifier
    pub id: MembershipId,
    /// Member
    pub user_id: UserId,
    /// Club
    pub club_id: ClubId,
    /// Role inside the club
    pub role: MembershipRole,
    /// Join time
    pub joined_at: DateTime<Utc>,
}
