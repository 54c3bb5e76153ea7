//! Device sync session
//!
//! A [`DeviceSession`] mirrors a device's library database into scratch
//! storage, lets callers add tracks to it, and writes it back under the
//! device-lock handshake.

mod config;
mod device_session;
mod state;
mod worker;

pub use config::SyncConfig;
pub use device_session::DeviceSession;
pub use state::SessionState;
