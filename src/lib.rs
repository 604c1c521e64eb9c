//! cftrack - client core for a Codeforces student-progress dashboard.
//!
//! # Overview
//!
//! cftrack talks to a student-tracking backend and keeps a client-side copy
//! of what the dashboard views need: one page of students, the profile of
//! whichever student is open, and the user-triggered operations still in
//! flight. Views read from the [`store::Store`] and subscribe to its changes.
//!
//! # Modules
//!
//! - [`remote`]: HTTP gateway to the backend and wire-format mapping
//! - [`store`]: Observable client state (students and processes)
//! - [`sync`]: Paginated, debounced-search list controller
//! - [`tracker`]: Process entries for background operations
//! - [`students`], [`settings`]: View operations built on the above
//! - [`profile`], [`export`]: Pure helpers for the profile view and CSV export
//! - [`api`]: Local HTTP surface for the views

pub mod api;
pub mod app;
pub mod config;
pub mod debounce;
pub mod error;
pub mod export;
pub mod model;
pub mod notify;
pub mod profile;
pub mod remote;
pub mod settings;
pub mod store;
pub mod students;
pub mod sync;
pub mod tracker;

pub use app::AppState;
pub use error::{ClientError, Result};
