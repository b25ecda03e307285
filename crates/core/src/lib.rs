//! Domain types for the aivoice job client.
//!
//! Everything here is pure: status vocabulary, polling parameters,
//! upload checks, download naming, voice lookup, and the notification
//! contract. The HTTP side lives in `aivoice-client`.

pub mod error;
pub mod job_status;
pub mod naming;
pub mod notification;
pub mod params;
pub mod poll_config;
pub mod types;
pub mod upload;
pub mod voice;
