//! Email bodies.

use super::Email;
use crate::types::{Event, Rsvp, User};

fn schedule(event: &Event) -> String {
    format!(
        "{} from {} to {}",
        event.date.format("%A, %B %-d, %Y"),
        event.start_time.format("%H:%M"),
        event.end_time.format("%H:%M"),
    )
}

fn layout(heading: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="UTF-8"><title>{heading}</title></head>
<body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333;">
    <div style="max-width: 600px; margin: 0 auto; padding: 20px;">
        <h2 style="color: #2563eb;">{heading}</h2>
        {body}
        <p style="color: #666; font-size: 12px; margin-top: 40px;">Eventure</p>
    </div>
</body>
</html>"#
    )
}

/// Sent after an RSVP is recorded, seat or waitlist.
#[must_use]
pub fn rsvp_confirmation(user: &User, event: &Event, rsvp: &Rsvp) -> Email {
    let waitlist = if rsvp.is_waitlisted() { " (you are on the waitlist)" } else { "" };
    let notes = rsvp.notes.as_deref().unwrap_or("None");
    let body = format!(
        "<p>Hi {name},</p>\
         <p>Your RSVP for <strong>{title}</strong> is confirmed{waitlist}.</p>\
         <p><strong>When:</strong> {when}</p>\
         <p><strong>Notes:</strong> {notes}</p>",
        name = user.name,
        title = event.title,
        when = schedule(event),
    );
    Email {
        to: user.email.clone(),
        subject: format!("✅ RSVP Confirmed: {}", event.title),
        html: layout("RSVP confirmed", &body),
    }
}

/// Sent to every confirmed attendee when an event is called off.
#[must_use]
pub fn event_cancelled(user: &User, event: &Event) -> Email {
    let body = format!(
        "<p>Hi {name},</p>\
         <p>We're sorry, <strong>{title}</strong> scheduled for {when} has been cancelled.</p>",
        name = user.name,
        title = event.title,
        when = schedule(event),
    );
    Email {
        to: user.email.clone(),
        subject: format!("❌ Event Cancelled: {}", event.title),
        html: layout("Event cancelled", &body),
    }
}

/// Sent to the members of the hosting club when an event is created.
#[must_use]
pub fn new_event(user: &User, event: &Event) -> Email {
    let description = event.description.as_deref().unwrap_or("");
    let body = format!(
        "<p>Hi {name},</p>\
         <p>Your club just announced <strong>{title}</strong>.</p>\
         <p>{description}</p>\
         <p><strong>When:</strong> {when}</p>\
         <p><strong>Seats:</strong> {seats}</p>",
        name = user.name,
        title = event.title,
        when = schedule(event),
        seats = event.seat_limit,
    );
    Email {
        to: user.email.clone(),
        subject: format!("🎉 New Event: {}", event.title),
        html: layout("New event", &body),
    }
}

/// Sent after registration.
#[must_use]
pub fn welcome(user: &User) -> Email {
    let body = format!(
        "<p>Hi {name},</p><p>Welcome to Eventure! Browse upcoming campus events and RSVP in one click.</p>",
        name = user.name,
    );
    Email {
        to: user.email.clone(),
        subject: "Welcome to Eventure".to_string(),
        html: layout("Welcome", &body),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::{EventId, EventStatus, Role, RsvpId, RsvpStatus, UserId};
    use chrono::{NaiveDate, NaiveTime, Utc};

    fn user() -> User {
        User {
            id: UserId::new(),
            name: "Ada".to_string(),
            email: "ada@campus.edu".to_string(),
            password_hash: String::new(),
            role: Role::Attendee,
            phone_number: None,
            created_at: Utc::now(),
        }
    }

    fn event() -> Event {
        Event {
            id: EventId::new(),
            title: "Jazz Night".to_string(),
            description: None,
            date: NaiveDate::from_ymd_opt(2026, 3, 14).unwrap(),
            start_time: NaiveTime::from_hms_opt(19, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(22, 0, 0).unwrap(),
            seat_limit: 50,
            status: EventStatus::Published,
            category_id: None,
            location_id: None,
            club_id: None,
            banner_image: None,
            created_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn rsvp(waitlist: bool, notes: Option<&str>) -> Rsvp {
        Rsvp {
            id: RsvpId::new(),
            user_id: UserId::new(),
            event_id: EventId::new(),
            status: RsvpStatus::Confirmed,
            waitlist,
            notes: notes.map(str::to_string),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn confirmation_mentions_schedule_and_notes() {
        let email = rsvp_confirmation(&user(), &event(), &rsvp(false, Some("Front row")));

        assert_eq!(email.subject, "✅ RSVP Confirmed: Jazz Night");
        assert!(email.html.contains("Saturday, March 14, 2026 from 19:00 to 22:00"));
        assert!(email.html.contains("Front row"));
        assert!(!email.html.contains("waitlist"));
    }

    #[test]
    fn waitlisted_confirmation_says_so() {
        let email = rsvp_confirmation(&user(), &event(), &rsvp(true, None));

        assert!(email.html.contains("(you are on the waitlist)"));
        assert!(email.html.contains("<strong>Notes:</strong> None"));
    }

    #[test]
    fn cancellation_subject() {
        assert_eq!(event_cancelled(&user(), &event()).subject, "❌ Event Cancelled: Jazz Night");
        assert_eq!(new_event(&user(), &event()).subject, "🎉 New Event: Jazz Night");
    }

    #[test]
    fn welcome_greets_by_name() {
        let email = welcome(&user());

        assert_eq!(email.to, "ada@campus.edu");
        assert_eq!(email.subject, "Welcome to Eventure");
        assert!(email.html.contains("Hi Ada,"));
    }
}
