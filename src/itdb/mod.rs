//! Library database handle
//!
//! Parses, mutates and serializes the device's media-library database.
//! The on-disk representation here is a JSON stand-in; the engine only
//! relies on the operations exposed by [`Database`] and the path
//! conversion helpers.

mod database;
pub mod path;

pub use database::{Database, DbTrack};
pub use path::{device_to_fs, fs_to_device};
