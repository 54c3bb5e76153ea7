//! Conversion between filesystem-style and device-native paths
//!
//! The device database stores paths with `:` as the separator
//! (`:iPod_Control:Music:F03:ABCD.mp3`), while the file primitives use
//! `/`-separated paths.

/// Convert a `/`-separated path to the device-native form
pub fn fs_to_device(path: &str) -> String {
    path.replace('/', ":")
}

/// Convert a device-native path back to the `/`-separated form
pub fn device_to_fs(path: &str) -> String {
    path.replace(':', "/")
}
