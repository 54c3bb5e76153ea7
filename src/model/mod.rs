//! Caller-facing track model
//!
//! These types are what the rest of the application sees: track metadata
//! handed to a session for copying, and the index of tracks visible on a
//! device once its database has loaded.

mod library;
mod track;

pub use library::Library;
pub use track::{file_location, Track};
