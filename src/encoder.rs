//! Track encoding for the device database
//!
//! Builds database records from caller metadata and fills in the
//! device-specific fields once the backing file has been placed.

use crate::itdb::{fs_to_device, DbTrack};
use crate::model::Track;

/// Four-character file type code for an extension
///
/// Byte `i` is the `i`-th upper-cased character of the extension, or a
/// space past its end. Extensions longer than four characters are cut.
/// Non-ASCII characters encode as `?`.
///
/// `"MP3"` encodes as `0x4D503320`.
pub fn filetype_marker(extension: &str) -> u32 {
    let mut chars = extension.chars().map(|c| c.to_ascii_uppercase());
    let mut marker = 0u32;
    for _ in 0..4 {
        let byte = match chars.next() {
            Some(c) if c.is_ascii() => c as u8,
            Some(_) => b'?',
            None => b' ',
        };
        marker = (marker << 8) | u32::from(byte);
    }
    marker
}

/// File type code for a device path, taken from its final extension
pub fn filetype_marker_for_path(path: &str) -> u32 {
    let name = path.rsplit('/').next().unwrap_or("");
    let extension = name.rsplit_once('.').map(|(_, ext)| ext).unwrap_or("");
    filetype_marker(extension)
}

/// Create a database record for a track that is about to be copied
///
/// The record is not transferred and has no device path yet.
pub fn new_record(metadata: &Track) -> DbTrack {
    let digest = md5::compute(metadata.location.as_bytes());
    let mut dbid_bytes = [0u8; 8];
    dbid_bytes.copy_from_slice(&digest[..8]);

    DbTrack {
        id: 0,
        dbid: u64::from_be_bytes(dbid_bytes),
        title: metadata.title.clone(),
        artist: metadata.artist.clone(),
        album: metadata.album.clone(),
        genre: metadata.genre.clone(),
        duration_ms: metadata.duration_ms,
        track_number: metadata.track_number,
        year: metadata.year,
        comment: metadata.comment.clone(),
        size: metadata.file_size,
        ipod_path: None,
        filetype_marker: 0,
        transferred: false,
        time_added: chrono::Utc::now().timestamp(),
    }
}

/// Fill in the fields that depend on the placed file
///
/// `dest` is the `/`-separated device path; it is stored in device-native form.
pub fn finish_record(record: &mut DbTrack, dest: &str) {
    record.transferred = true;
    record.filetype_marker = filetype_marker_for_path(dest);
    record.ipod_path = Some(fs_to_device(dest));

    log::debug!(
        "Record {}: marker {:#010x}, path {:?}",
        record.id,
        record.filetype_marker,
        record.ipod_path
    );
}
