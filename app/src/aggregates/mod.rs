//! Reducers for Eventure.
//!
//! - RSVP: admission control for event seats and the waitlist

pub mod rsvp;

pub use rsvp::{AdmissionReducer, AdmissionStore, RsvpAction};
