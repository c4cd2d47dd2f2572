//! Typed request models and their validation.
//!
//! Each `*Request` is a raw JSON body. Field rules (lengths, emails, URLs,
//! ranges) are declared with `validator`; `parse` runs them, then converts
//! dates, times, ids and enums, collecting every failure before returning
//! the typed command handlers work with.

use crate::types::{
    CategoryId, ClubId, EventId, EventStatus, LocationId, MembershipRole, Role, UserId,
};
use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;
use validator::{Validate, ValidationErrors};

/// One field that failed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// JSON field name
    pub field: String,
    /// What is wrong with it
    pub message: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field, self.message)
    }
}

/// A request body that failed validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}", summary(.errors))]
pub struct ValidationError {
    /// Every failing field, sorted by name
    pub errors: Vec<FieldError>,
}

fn summary(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationError {
    /// A single failing field.
    #[must_use]
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        Self { errors: vec![FieldError { field: field.to_string(), message: message.into() }] }
    }

    /// Messages for the response `details` array.
    #[must_use]
    pub fn details(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }

    /// Whether `field` failed.
    #[must_use]
    pub fn has(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }
}

/// `phone_number` -> `phoneNumber`
fn camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Accumulates field errors while a request is converted.
#[derive(Debug, Default)]
struct Checker {
    errors: Vec<FieldError>,
}

impl Checker {
    /// Run the declared field rules.
    fn rules(request: &impl Validate) -> Self {
        let mut checker = Self::default();
        if let Err(errors) = request.validate() {
            checker.absorb(&errors);
        }
        checker
    }

    fn absorb(&mut self, errors: &ValidationErrors) {
        for (field, failures) in errors.field_errors() {
            for failure in failures {
                let message = failure
                    .message
                    .clone()
                    .map_or_else(|| format!("is invalid ({})", failure.code), Cow::into_owned);
                self.fail(&camel_case(field), message);
            }
        }
    }

    fn fail(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(FieldError { field: field.to_string(), message: message.into() });
    }

    fn has(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    fn id<T: FromStr>(&mut self, field: &str, value: &str) -> Option<T> {
        let parsed = value.trim().parse().ok();
        if parsed.is_none() {
            self.fail(field, "must be a valid id");
        }
        parsed
    }

    fn optional_id<T: FromStr>(&mut self, field: &str, value: Option<&str>) -> Option<T> {
        optional_text(value).and_then(|v| self.id(field, &v))
    }

    fn date(&mut self, field: &str, value: &str) -> Option<NaiveDate> {
        let value = value.trim();
        // Date pickers may send a full timestamp; keep the day.
        let day = value.split('T').next().unwrap_or(value);
        let parsed = NaiveDate::parse_from_str(day, "%Y-%m-%d").ok();
        if parsed.is_none() {
            self.fail(field, "must be a date (YYYY-MM-DD)");
        }
        parsed
    }

    fn time(&mut self, field: &str, value: &str) -> Option<NaiveTime> {
        let value = value.trim();
        let parsed = NaiveTime::parse_from_str(value, "%H:%M:%S")
            .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
            .ok();
        if parsed.is_none() {
            self.fail(field, "must be a time (HH:MM or HH:MM:SS)");
        }
        parsed
    }

    /// Negative values were already reported by the range rule.
    fn count(value: Option<i64>) -> Option<u32> {
        value.and_then(|v| u32::try_from(v).ok())
    }

    fn choice<T: FromStr>(&mut self, field: &str, value: Option<&str>, allowed: &str) -> Option<T> {
        let value = optional_text(value)?;
        let parsed = value.parse().ok();
        if parsed.is_none() {
            self.fail(field, format!("must be one of {allowed}"));
        }
        parsed
    }

    fn finish<T>(mut self, value: impl FnOnce() -> Option<T>) -> Result<T, ValidationError> {
        if !self.errors.is_empty() {
            self.errors.sort_by(|a, b| a.field.cmp(&b.field));
            return Err(ValidationError { errors: self.errors });
        }
        // Every `None` above records an error, so this only trips on a missed check.
        value().ok_or_else(|| ValidationError::single("body", "is invalid"))
    }
}

fn optional_text(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

fn validate_phone(phone: &str) -> Result<(), validator::ValidationError> {
    if phone.len() == 11 && phone.chars().all(|c| c.is_ascii_digit()) {
        return Ok(());
    }
    let mut error = validator::ValidationError::new("phone");
    error.message = Some(Cow::Borrowed("must be exactly 11 digits"));
    Err(error)
}

// ============================================================================
// Auth
// ============================================================================

/// `POST /api/auth/register`
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    /// Display name
    #[serde(default)]
    #[validate(length(min = 3, max = 50, message = "must be between 3 and 50 characters"))]
    pub name: String,
    /// Login email
    #[serde(default)]
    #[validate(email(message = "must be a valid email"))]
    pub email: String,
    /// Plain-text password
    #[serde(default)]
    #[validate(length(min = 6, message = "must be at least 6 characters"))]
    pub password: String,
    /// `admin` or `attendee`
    pub role: Option<String>,
    /// 11-digit phone number
    #[validate(custom(function = "validate_phone"))]
    pub phone_number: Option<String>,
}

/// Validated registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    /// Display name
    pub name: String,
    /// Lower-cased email
    pub email: String,
    /// Plain-text password, hashed before storage
    pub password: String,
    /// Account role
    pub role: Role,
    /// Phone number
    pub phone_number: Option<String>,
}

impl RegisterRequest {
    /// Validate the registration form.
    ///
    /// # Errors
    ///
    /// Returns every failing field.
    pub fn parse(self) -> Result<NewUser, ValidationError> {
        let mut check = Checker::rules(&self);
        let role = check
            .choice("role", self.role.as_deref(), "admin, attendee")
            .unwrap_or_default();

        check.finish(|| {
            Some(NewUser {
                name: self.name.trim().to_string(),
                email: self.email.trim().to_lowercase(),
                password: self.password,
                role,
                phone_number: optional_text(self.phone_number.as_deref()),
            })
        })
    }
}

/// `POST /api/auth/login`
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    /// Login email
    #[serde(default)]
    #[validate(email(message = "must be a valid email"))]
    pub email: String,
    /// Plain-text password
    #[serde(default)]
    #[validate(length(min = 1, message = "is required"))]
    pub password: String,
}

/// Validated login attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Lower-cased email
    pub email: String,
    /// Plain-text password
    pub password: String,
}

impl LoginRequest {
    /// Validate the login form.
    ///
    /// # Errors
    ///
    /// Returns every failing field.
    pub fn parse(self) -> Result<Credentials, ValidationError> {
        Checker::rules(&self).finish(|| {
            Some(Credentials { email: self.email.trim().to_lowercase(), password: self.password })
        })
    }
}

// ============================================================================
// RSVPs
// ============================================================================

/// `POST /api/rsvps`
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateRsvpRequest {
    /// Event to RSVP for
    #[serde(default)]
    pub event_id: String,
    /// Attendee notes
    #[validate(length(max = 500, message = "must be at most 500 characters"))]
    pub notes: Option<String>,
}

/// Validated RSVP request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RsvpCommand {
    /// Event to RSVP for
    pub event_id: EventId,
    /// Attendee notes
    pub notes: Option<String>,
}

impl CreateRsvpRequest {
    /// Validate the RSVP body.
    ///
    /// # Errors
    ///
    /// Returns every failing field.
    pub fn parse(self) -> Result<RsvpCommand, ValidationError> {
        let mut check = Checker::rules(&self);
        let event_id = check.id("eventId", &self.event_id);
        check.finish(|| {
            Some(RsvpCommand { event_id: event_id?, notes: optional_text(self.notes.as_deref()) })
        })
    }
}

// ============================================================================
// Events
// ============================================================================

/// `POST /api/events`
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    /// Title
    #[serde(default)]
    #[validate(length(min = 3, max = 200, message = "must be between 3 and 200 characters"))]
    pub title: String,
    /// Description
    pub description: Option<String>,
    /// `YYYY-MM-DD`
    #[serde(default)]
    pub date: String,
    /// `HH:MM[:SS]`
    #[serde(default)]
    pub start_time: String,
    /// `HH:MM[:SS]`
    #[serde(default)]
    pub end_time: String,
    /// Non-negative seat limit
    #[validate(
        required(message = "is required"),
        range(min = 0, max = 1_000_000, message = "must be between 0 and 1000000")
    )]
    pub seat_limit: Option<i64>,
    /// Category id
    pub category_id: Option<String>,
    /// Location id
    pub location_id: Option<String>,
    /// Club id
    pub club_id: Option<String>,
    /// Banner image URL
    #[validate(url(message = "must be a valid URI"))]
    pub banner_image: Option<String>,
    /// `draft`, `published` or `cancelled`
    pub status: Option<String>,
}

/// Validated event fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventDraft {
    /// Title
    pub title: String,
    /// Description
    pub description: Option<String>,
    /// Day
    pub date: NaiveDate,
    /// Start time
    pub start_time: NaiveTime,
    /// End time
    pub end_time: NaiveTime,
    /// Seat limit
    pub seat_limit: u32,
    /// Status
    pub status: EventStatus,
    /// Category
    pub category_id: Option<CategoryId>,
    /// Location
    pub location_id: Option<LocationId>,
    /// Club
    pub club_id: Option<ClubId>,
    /// Banner image URL
    pub banner_image: Option<String>,
}

impl CreateEventRequest {
    /// Validate the event form.
    ///
    /// # Errors
    ///
    /// Returns every failing field.
    pub fn parse(self) -> Result<EventDraft, ValidationError> {
        let mut check = Checker::rules(&self);
        let date = check.date("date", &self.date);
        let start_time = check.time("startTime", &self.start_time);
        let end_time = check.time("endTime", &self.end_time);
        if let (Some(start), Some(end)) = (start_time, end_time) {
            if end < start {
                check.fail("endTime", "must not be before startTime");
            }
        }
        let status = check
            .choice("status", self.status.as_deref(), "draft, published, cancelled")
            .unwrap_or_default();
        let category_id = check.optional_id("categoryId", self.category_id.as_deref());
        let location_id = check.optional_id("locationId", self.location_id.as_deref());
        let club_id = check.optional_id("clubId", self.club_id.as_deref());
        let seat_limit = Checker::count(self.seat_limit);

        check.finish(|| {
            Some(EventDraft {
                title: self.title.trim().to_string(),
                description: optional_text(self.description.as_deref()),
                date: date?,
                start_time: start_time?,
                end_time: end_time?,
                seat_limit: seat_limit?,
                status,
                category_id,
                location_id,
                club_id,
                banner_image: optional_text(self.banner_image.as_deref()),
            })
        })
    }
}

/// `PUT /api/events/:id`; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEventRequest {
    /// Title
    #[validate(length(min = 3, max = 200, message = "must be between 3 and 200 characters"))]
    pub title: Option<String>,
    /// Description
    pub description: Option<String>,
    /// `YYYY-MM-DD`
    pub date: Option<String>,
    /// `HH:MM[:SS]`
    pub start_time: Option<String>,
    /// `HH:MM[:SS]`
    pub end_time: Option<String>,
    /// Non-negative seat limit
    #[validate(range(min = 0, max = 1_000_000, message = "must be between 0 and 1000000"))]
    pub seat_limit: Option<i64>,
    /// Category id
    pub category_id: Option<String>,
    /// Location id
    pub location_id: Option<String>,
    /// Club id
    pub club_id: Option<String>,
    /// Banner image URL
    #[validate(url(message = "must be a valid URI"))]
    pub banner_image: Option<String>,
    /// `draft` or `published`; cancelling has its own route
    pub status: Option<String>,
}

/// Validated partial update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventPatch {
    /// Title
    pub title: Option<String>,
    /// Description
    pub description: Option<String>,
    /// Day
    pub date: Option<NaiveDate>,
    /// Start time
    pub start_time: Option<NaiveTime>,
    /// End time
    pub end_time: Option<NaiveTime>,
    /// Seat limit
    pub seat_limit: Option<u32>,
    /// Category
    pub category_id: Option<CategoryId>,
    /// Location
    pub location_id: Option<LocationId>,
    /// Club
    pub club_id: Option<ClubId>,
    /// Banner image URL
    pub banner_image: Option<String>,
    /// Status
    pub status: Option<EventStatus>,
}

impl UpdateEventRequest {
    /// Validate the fields that are present.
    ///
    /// # Errors
    ///
    /// Returns every failing field.
    pub fn parse(self) -> Result<EventPatch, ValidationError> {
        let mut check = Checker::rules(&self);
        let date = self.date.as_deref().and_then(|d| check.date("date", d));
        let start_time = self.start_time.as_deref().and_then(|t| check.time("startTime", t));
        let end_time = self.end_time.as_deref().and_then(|t| check.time("endTime", t));
        let status = check.choice("status", self.status.as_deref(), "draft, published");
        if status == Some(EventStatus::Cancelled) {
            check.fail("status", "use the cancel endpoint to cancel an event");
        }
        let category_id = check.optional_id("categoryId", self.category_id.as_deref());
        let location_id = check.optional_id("locationId", self.location_id.as_deref());
        let club_id = check.optional_id("clubId", self.club_id.as_deref());

        check.finish(|| {
            Some(EventPatch {
                title: self.title.map(|t| t.trim().to_string()),
                description: optional_text(self.description.as_deref()),
                date,
                start_time,
                end_time,
                seat_limit: Checker::count(self.seat_limit),
                category_id,
                location_id,
                club_id,
                banner_image: optional_text(self.banner_image.as_deref()),
                status,
            })
        })
    }
}

/// Check the combined schedule once a patch is applied.
///
/// # Errors
///
/// Fails when the end precedes the start.
pub fn validate_schedule(start: NaiveTime, end: NaiveTime) -> Result<(), ValidationError> {
    if end < start {
        return Err(ValidationError::single("endTime", "must not be before startTime"));
    }
    Ok(())
}

// ============================================================================
// Catalog
// ============================================================================

/// `POST /api/categories`
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CategoryRequest {
    /// Unique name
    #[serde(default)]
    #[validate(length(min = 2, max = 100, message = "must be between 2 and 100 characters"))]
    pub name: String,
    /// Description
    pub description: Option<String>,
}

/// Validated category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCategory {
    /// Name
    pub name: String,
    /// Description
    pub description: Option<String>,
}

impl CategoryRequest {
    /// Validate the category form.
    ///
    /// # Errors
    ///
    /// Returns every failing field.
    pub fn parse(self) -> Result<NewCategory, ValidationError> {
        Checker::rules(&self).finish(|| {
            Some(NewCategory {
                name: self.name.trim().to_string(),
                description: optional_text(self.description.as_deref()),
            })
        })
    }
}

/// `POST /api/locations`
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LocationRequest {
    /// Name
    #[serde(default)]
    #[validate(length(min = 2, max = 100, message = "must be between 2 and 100 characters"))]
    pub name: String,
    /// Description
    pub description: Option<String>,
    /// Room capacity
    #[validate(range(min = 0, max = 1_000_000, message = "must be between 0 and 1000000"))]
    pub capacity: Option<i64>,
}

/// Validated location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLocation {
    /// Name
    pub name: String,
    /// Description
    pub description: Option<String>,
    /// Capacity
    pub capacity: Option<u32>,
}

impl LocationRequest {
    /// Validate the location form.
    ///
    /// # Errors
    ///
    /// Returns every failing field.
    pub fn parse(self) -> Result<NewLocation, ValidationError> {
        Checker::rules(&self).finish(|| {
            Some(NewLocation {
                name: self.name.trim().to_string(),
                description: optional_text(self.description.as_deref()),
                capacity: Checker::count(self.capacity),
            })
        })
    }
}

/// `POST /api/clubs`
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ClubRequest {
    /// Unique name
    #[serde(default)]
    #[validate(length(min = 2, max = 100, message = "must be between 2 and 100 characters"))]
    pub name: String,
    /// Description
    pub description: Option<String>,
    /// Contact address
    #[validate(email(message = "must be a valid email"))]
    pub contact_email: Option<String>,
    /// Logo URL
    #[validate(url(message = "must be a valid URI"))]
    pub logo: Option<String>,
}

/// Validated club.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewClub {
    /// Name
    pub name: String,
    /// Description
    pub description: Option<String>,
    /// Contact address
    pub contact_email: Option<String>,
    /// Logo URL
    pub logo: Option<String>,
}

impl ClubRequest {
    /// Validate the club form.
    ///
    /// # Errors
    ///
    /// Returns every failing field.
    pub fn parse(self) -> Result<NewClub, ValidationError> {
        Checker::rules(&self).finish(|| {
            Some(NewClub {
                name: self.name.trim().to_string(),
                description: optional_text(self.description.as_deref()),
                contact_email: optional_text(self.contact_email.as_deref())
                    .map(|e| e.to_lowercase()),
                logo: optional_text(self.logo.as_deref()),
            })
        })
    }
}

// ============================================================================
// Memberships
// ============================================================================

const MEMBERSHIP_ROLES: &str = "MEMBER, ADMIN, PRESIDENT";

/// `POST /api/memberships`
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MembershipRequest {
    /// Member; defaults to the caller
    pub user_id: Option<String>,
    /// Club to join
    #[serde(default)]
    pub club_id: String,
    /// Role inside the club
    pub role: Option<String>,
}

/// Validated membership.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMembership {
    /// Member, `None` means the caller
    pub user_id: Option<UserId>,
    /// Club
    pub club_id: ClubId,
    /// Role
    pub role: MembershipRole,
}

impl MembershipRequest {
    /// Validate the membership form.
    ///
    /// # Errors
    ///
    /// Returns every failing field.
    pub fn parse(self) -> Result<NewMembership, ValidationError> {
        let mut check = Checker::rules(&self);
        let user_id = check.optional_id("userId", self.user_id.as_deref());
        let club_id = check.id("clubId", &self.club_id);
        let role = check
            .choice("role", self.role.as_deref(), MEMBERSHIP_ROLES)
            .unwrap_or_default();
        check.finish(|| Some(NewMembership { user_id, club_id: club_id?, role }))
    }
}

/// `PUT /api/memberships/:id`
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateMembershipRequest {
    /// New role
    #[validate(required(message = "is required"))]
    pub role: Option<String>,
}

impl UpdateMembershipRequest {
    /// Validate the new role.
    ///
    /// # Errors
    ///
    /// Fails when the role is missing or unknown.
    pub fn parse(self) -> Result<MembershipRole, ValidationError> {
        let mut check = Checker::rules(&self);
        let role = check.choice("role", self.role.as_deref(), MEMBERSHIP_ROLES);
        if role.is_none() && !check.has("role") {
            check.fail("role", "is required");
        }
        check.finish(|| role)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn event_request() -> CreateEventRequest {
        CreateEventRequest {
            title: "Hack Night".to_string(),
            description: Some("  ".to_string()),
            date: "2026-04-10".to_string(),
            start_time: "18:00".to_string(),
            end_time: "21:30:00".to_string(),
            seat_limit: Some(40),
            category_id: None,
            location_id: None,
            club_id: None,
            banner_image: Some("https://cdn.campus.edu/hack.png".to_string()),
            status: None,
        }
    }

    fn fields(err: &ValidationError) -> Vec<&str> {
        err.errors.iter().map(|e| e.field.as_str()).collect()
    }

    #[test]
    fn register_collects_every_failure() {
        let err = RegisterRequest {
            name: "Al".to_string(),
            email: "not-an-email".to_string(),
            password: "123".to_string(),
            role: Some("owner".to_string()),
            phone_number: Some("12345".to_string()),
        }
        .parse()
        .unwrap_err();

        assert_eq!(fields(&err), ["email", "name", "password", "phoneNumber", "role"]);
        assert!(err.to_string().contains("phoneNumber must be exactly 11 digits"));
    }

    #[test]
    fn register_normalizes_and_defaults_role() {
        let user = RegisterRequest {
            name: "Grace Hopper ".to_string(),
            email: "Grace@Campus.EDU".to_string(),
            password: "cobol1959".to_string(),
            role: None,
            phone_number: Some("01234567890".to_string()),
        }
        .parse()
        .unwrap();

        assert_eq!(user.name, "Grace Hopper");
        assert_eq!(user.email, "grace@campus.edu");
        assert_eq!(user.role, Role::Attendee);
    }

    #[test]
    fn rsvp_requires_a_valid_event_id() {
        let err = CreateRsvpRequest { event_id: "42".to_string(), notes: None }
            .parse()
            .unwrap_err();
        assert!(err.has("eventId"));

        let id = EventId::new();
        let command =
            CreateRsvpRequest { event_id: id.to_string(), notes: Some(" vegan ".to_string()) }
                .parse()
                .unwrap();
        assert_eq!(command.event_id, id);
        assert_eq!(command.notes.as_deref(), Some("vegan"));
    }

    #[test]
    fn event_accepts_short_times_and_drops_blank_description() {
        let draft = event_request().parse().unwrap();

        assert_eq!(draft.start_time, NaiveTime::from_hms_opt(18, 0, 0).unwrap());
        assert_eq!(draft.seat_limit, 40);
        assert_eq!(draft.status, EventStatus::Published);
        assert!(draft.description.is_none());
    }

    #[test]
    fn event_seat_limit_zero_is_allowed_but_negative_or_missing_is_not() {
        let mut request = event_request();
        request.seat_limit = Some(0);
        assert_eq!(request.parse().unwrap().seat_limit, 0);

        let mut request = event_request();
        request.seat_limit = Some(-1);
        assert!(request.parse().unwrap_err().has("seatLimit"));

        let mut request = event_request();
        request.seat_limit = None;
        assert!(request.parse().unwrap_err().has("seatLimit"));
    }

    #[test]
    fn event_rejects_inverted_schedule_and_bad_banner() {
        let mut request = event_request();
        request.end_time = "17:00".to_string();
        request.banner_image = Some("not a uri".to_string());

        assert_eq!(fields(&request.parse().unwrap_err()), ["bannerImage", "endTime"]);
    }

    #[test]
    fn date_keeps_the_day_of_a_timestamp() {
        let mut request = event_request();
        request.date = "2026-04-10T00:00:00.000Z".to_string();
        assert_eq!(request.parse().unwrap().date, NaiveDate::from_ymd_opt(2026, 4, 10).unwrap());
    }

    #[test]
    fn update_cannot_cancel() {
        let err = UpdateEventRequest { status: Some("cancelled".to_string()), ..Default::default() }
            .parse()
            .unwrap_err();
        assert!(err.has("status"));

        let patch = UpdateEventRequest { seat_limit: Some(5), ..Default::default() }
            .parse()
            .unwrap();
        assert_eq!(patch.seat_limit, Some(5));
        assert!(patch.title.is_none());
    }

    #[test]
    fn schedule_check_allows_equal_times() {
        let nine = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        let eight = NaiveTime::from_hms_opt(8, 0, 0).unwrap();
        assert!(validate_schedule(nine, nine).is_ok());
        assert!(validate_schedule(nine, eight).unwrap_err().has("endTime"));
    }

    #[test]
    fn membership_role_defaults_to_member() {
        let club = ClubId::new();
        let membership = MembershipRequest { user_id: None, club_id: club.to_string(), role: None }
            .parse()
            .unwrap();
        assert_eq!(membership.role, MembershipRole::Member);
        assert_eq!(membership.club_id, club);

        assert!(UpdateMembershipRequest { role: None }.parse().unwrap_err().has("role"));
        assert!(UpdateMembershipRequest { role: Some("captain".into()) }.parse().is_err());
        assert_eq!(
            UpdateMembershipRequest { role: Some("ADMIN".into()) }.parse().unwrap(),
            MembershipRole::Admin
        );
    }

    #[test]
    fn snake_case_fields_are_reported_in_camel_case() {
        assert_eq!(camel_case("phone_number"), "phoneNumber");
        assert_eq!(camel_case("banner_image"), "bannerImage");
        assert_eq!(camel_case("name"), "name");
    }
}
