//! Eventure - campus event management with race-free RSVP admission.
//!
//! Users browse events and RSVP; admins manage events, categories,
//! locations, clubs and users. Most of the API is plain CRUD over the
//! [`stores`] repositories. RSVPs are different: every admission decision
//! runs through one reducer so that concurrent requests cannot oversubscribe
//! an event.
//!
//! # Architecture
//!
//! ```text
//!   HTTP (axum)
//!      │
//!      ├── CRUD handlers ──────────────► Repositories (memory | PostgreSQL)
//!      │                                      ▲
//!      └── POST /api/rsvps ─► AdmissionStore ─┤  (reducer under the store's
//!                              │              │   write lock, effects feed
//!                              └─► Mailer     │   back in as actions)
//! ```
//!
//! # Admission rule
//!
//! ```text
//! confirmed = RSVPs with status = confirmed (waitlisted ones included)
//!
//! if confirmed < seat_limit {
//!     confirmed, waitlist = false
//! } else {
//!     confirmed, waitlist = true
//! }
//! ```
//!
//! Cancelling frees a place; nobody on the waitlist is promoted, and
//! waitlisted RSVPs keep counting against the limit.
//!
//! See [`aggregates::rsvp`] for the reducer and its tests.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod aggregates;
pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod metrics;
pub mod notifications;
pub mod server;
pub mod stores;
pub mod types;
pub mod validation;

pub use config::Config;
pub use server::{AppState, build_router};
pub use types::*;
