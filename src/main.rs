use anyhow::{Context, Result};
use clap::Parser;
use device_sync::device::DirectoryConnector;
use device_sync::tags::read_metadata_or_default;
use device_sync::{DeviceSession, SyncConfig};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "device-sync")]
#[command(about = "Sync tracks onto a portable device's library database", long_about = None)]
struct Args {
    /// Directory holding one sub-directory per device, named by host
    #[arg(short = 'r', long, default_value = "~/.local/share/device-sync/devices")]
    device_root: String,

    /// Device identifier (host)
    #[arg(long)]
    host: String,

    /// Files to copy onto the device (can be specified multiple times)
    #[arg(short = 'c', long = "copy")]
    copy: Vec<PathBuf>,

    /// Delete each source file after it has been copied
    #[arg(long)]
    remove_original: bool,

    /// List the tracks on the device
    #[arg(short = 'l', long)]
    list: bool,

    /// First sync with this device (create the database if missing)
    #[arg(long)]
    first_time: bool,

    /// Location of the library database on the device
    #[arg(long, default_value = "/iPod_Control/iTunes/iTunesDB")]
    database_path: String,

    /// Number of music directories to use when the device reports none
    #[arg(long, default_value = "20")]
    music_dirs: u32,

    /// Verbose logging
    #[arg(short = 'v', long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    // Expand ~ in paths
    let device_root = shellexpand::tilde(&args.device_root);
    let connector = Arc::new(DirectoryConnector::new(PathBuf::from(device_root.as_ref())));

    let config = SyncConfig::new()
        .with_database_path(&args.database_path)
        .with_first_time(args.first_time)
        .with_music_dirs(args.music_dirs);

    let mut session = DeviceSession::new(&args.host, connector, config);
    session.start()?;
    session
        .wait()
        .with_context(|| format!("Failed to open device {}", session.host()))?;

    log::info!("Device {} ready: {} tracks", session.host(), session.track_count());

    if args.list {
        let mut tracks: Vec<_> = session.tracks().collect();
        tracks.sort_by(|a, b| (&a.artist, &a.album, &a.title).cmp(&(&b.artist, &b.album, &b.title)));
        for track in tracks {
            println!("{} - {} - {}  [{}]", track.artist, track.album, track.title, track.location);
        }
    }

    if !args.copy.is_empty() {
        let mut copied = 0;
        for (i, source) in args.copy.iter().enumerate() {
            let metadata = read_metadata_or_default(source);
            log::info!(
                "[{}/{}] Copying: {} - {}",
                i + 1,
                args.copy.len(),
                metadata.artist,
                metadata.title
            );

            if session.copy_to_storage(source, &metadata, args.remove_original)? {
                copied += 1;
            } else {
                log::error!("Failed to copy {:?}", source);
            }
        }
        log::info!("Copied {}/{} files", copied, args.copy.len());

        session.finalise()?;
        log::info!("Database written to device {}", session.host());
    }

    session.close()?;
    Ok(())
}
