//! Business metrics for Eventure.
//!
//! # Exported Metrics
//!
//! ## Counters
//! - `eventure.rsvp.requests` - RSVP requests reaching the admission reducer
//! - `eventure.rsvp.confirmed` - RSVPs admitted to a seat
//! - `eventure.rsvp.waitlisted` - RSVPs admitted to the waitlist
//! - `eventure.rsvp.rejected{reason}` - Requests turned down
//! - `eventure.rsvp.cancelled` - RSVPs cancelled
//! - `eventure.email.failed` - Notification emails that could not be sent

use metrics::describe_counter;

/// Register business metric descriptions.
///
/// Call once at startup, after the recorder is installed.
pub fn register_business_metrics() {
    describe_counter!(
        "eventure.rsvp.requests",
        "Number of RSVP requests reaching the admission reducer"
    );
    describe_counter!("eventure.rsvp.confirmed", "Number of RSVPs admitted to a seat");
    describe_counter!("eventure.rsvp.waitlisted", "Number of RSVPs admitted to the waitlist");
    describe_counter!(
        "eventure.rsvp.rejected",
        "Number of RSVP requests turned down, by reason"
    );
    describe_counter!("eventure.rsvp.cancelled", "Number of RSVPs cancelled");
    describe_counter!("eventure.email.failed", "Number of notification emails that failed to send");

    tracing::debug!("Business metrics registered");
}
