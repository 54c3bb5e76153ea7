//! Device file primitives
//!
//! A device exposes a restricted file-access protocol rather than a mounted
//! filesystem. The session only talks to it through [`DeviceConnection`];
//! connections are opened per operation through a [`DeviceConnector`] and
//! are never shared between threads.

mod filename;
mod mounted;

pub use filename::{allocate_unused_path, MUSIC_ROOT};
pub use mounted::{DirectoryConnector, MountedDevice};

use anyhow::Result;
use std::io::{Read, Write};

/// Device-relative path of the sysinfo file
pub const SYSINFO_PATH: &str = "/iPod_Control/Device/SysInfo";

/// An open connection to one device
///
/// Paths are device-relative and `/`-separated, e.g.
/// `/iPod_Control/iTunes/iTunesDB`.
pub trait DeviceConnection {
    /// Open a device file for reading
    fn open_read(&self, path: &str) -> Result<Box<dyn Read>>;

    /// Open a device file for writing, truncating it and creating parent
    /// directories as needed
    fn open_write(&self, path: &str) -> Result<Box<dyn Write>>;

    fn exists(&self, path: &str) -> bool;

    fn remove(&self, path: &str) -> Result<()>;

    /// Number of `Fnn` music directories the device provides (0 if unknown)
    fn music_dir_count(&self) -> u32;

    /// Read a device sysinfo value
    fn sysinfo(&self, key: &str) -> Result<Option<String>>;

    /// Set or unset (`None`) a device sysinfo value
    fn set_sysinfo(&self, key: &str, value: Option<&str>) -> Result<()>;
}

/// Opens connections to devices by host identifier
pub trait DeviceConnector: Send + Sync {
    fn connect(&self, host: &str) -> Result<Box<dyn DeviceConnection>>;
}
