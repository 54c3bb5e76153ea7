//! Device Sync - portable device library database synchronization
//!
//! Mirrors a device's media-library database to local scratch storage,
//! adds tracks and their media files to it, and writes the database back
//! to the device.

pub mod device;
pub mod encoder;
pub mod error;
pub mod itdb;
pub mod loader;
pub mod model;
pub mod progress;
pub mod session;
pub mod tags;
pub mod transfer;

pub use error::{Result, SyncError};
pub use session::{DeviceSession, SessionState, SyncConfig};
