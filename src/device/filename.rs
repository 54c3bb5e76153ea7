//! Unused filename allocation for new music files

use super::DeviceConnection;
use crate::itdb::{fs_to_device, Database};
use crate::model::Track;

/// Device-relative directory holding the `Fnn` music directories
pub const MUSIC_ROOT: &str = "/iPod_Control/Music";

const MAX_ATTEMPTS: u32 = 64;

/// Pick a device path for a new file that neither exists on the device nor
/// is referenced by the database
///
/// Names look like `/iPod_Control/Music/F07/QKZD.mp3`. Returns `None` when
/// the track has no extension, there are no music directories, or every
/// candidate is taken.
pub fn allocate_unused_path(
    connection: &dyn DeviceConnection,
    db: &Database,
    metadata: &Track,
    music_dirs: u32,
) -> Option<String> {
    let extension = metadata.extension();
    if extension.is_empty() {
        log::warn!("No extension on {}, cannot name device file", metadata.location);
        return None;
    }
    if music_dirs == 0 {
        log::warn!("Device has no music directories");
        return None;
    }

    for attempt in 0..MAX_ATTEMPTS {
        let candidate = candidate_path(&metadata.location, extension, music_dirs, attempt);

        if connection.exists(&candidate) || db.contains_path(&fs_to_device(&candidate)) {
            log::debug!("Filename {} taken, retrying", candidate);
            continue;
        }
        return Some(candidate);
    }

    log::warn!(
        "Gave up finding an unused filename for {} after {} attempts",
        metadata.location,
        MAX_ATTEMPTS
    );
    None
}

fn candidate_path(location: &str, extension: &str, music_dirs: u32, attempt: u32) -> String {
    let digest = md5::compute(format!("{}#{}", location, attempt).as_bytes());
    let dir = u32::from(digest[0]) % music_dirs;
    let stem: String = digest[1..5]
        .iter()
        .map(|b| char::from(b'A' + b % 26))
        .collect();

    format!("{}/F{:02}/{}.{}", MUSIC_ROOT, dir, stem, extension)
}
