//! Directory-backed device
//!
//! Stands in for an AFC-style device: each device is a directory under a
//! common root, named by its host identifier.

use super::filename::MUSIC_ROOT;
use super::{DeviceConnection, DeviceConnector, SYSINFO_PATH};
use anyhow::{bail, Context, Result};
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// Connection to a device rooted at a local directory
pub struct MountedDevice {
    root: PathBuf,
}

impl MountedDevice {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Map a device-relative path onto the local directory
    fn resolve(&self, path: &str) -> Result<PathBuf> {
        let relative = Path::new(path.trim_start_matches('/'));
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            bail!("Invalid device path: {}", path);
        }
        Ok(self.root.join(relative))
    }

    fn read_sysinfo(&self) -> Result<Vec<(String, String)>> {
        let path = self.resolve(SYSINFO_PATH)?;
        if !path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read sysinfo: {:?}", path))?;

        Ok(content
            .lines()
            .filter_map(|line| {
                let (key, value) = line.split_once(':')?;
                Some((key.trim().to_string(), value.trim().to_string()))
            })
            .collect())
    }
}

impl DeviceConnection for MountedDevice {
    fn open_read(&self, path: &str) -> Result<Box<dyn Read>> {
        let local = self.resolve(path)?;
        let file = File::open(&local)
            .with_context(|| format!("Failed to open device file for reading: {}", path))?;
        Ok(Box::new(file))
    }

    fn open_write(&self, path: &str) -> Result<Box<dyn Write>> {
        let local = self.resolve(path)?;
        if let Some(parent) = local.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = File::create(&local)
            .with_context(|| format!("Failed to open device file for writing: {}", path))?;
        Ok(Box::new(file))
    }

    fn exists(&self, path: &str) -> bool {
        self.resolve(path).map(|p| p.exists()).unwrap_or(false)
    }

    fn remove(&self, path: &str) -> Result<()> {
        let local = self.resolve(path)?;
        fs::remove_file(&local)
            .with_context(|| format!("Failed to remove device file: {}", path))
    }

    fn music_dir_count(&self) -> u32 {
        let Ok(music_root) = self.resolve(MUSIC_ROOT) else {
            return 0;
        };

        WalkDir::new(music_root)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_dir())
            .filter(|e| {
                let name = e.file_name().to_string_lossy();
                name.len() == 3
                    && name.starts_with('F')
                    && name[1..].chars().all(|c| c.is_ascii_digit())
            })
            .count() as u32
    }

    fn sysinfo(&self, key: &str) -> Result<Option<String>> {
        Ok(self
            .read_sysinfo()?
            .into_iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v))
    }

    fn set_sysinfo(&self, key: &str, value: Option<&str>) -> Result<()> {
        let mut entries = self.read_sysinfo()?;
        entries.retain(|(k, _)| k != key);
        if let Some(value) = value {
            entries.push((key.to_string(), value.to_string()));
        }

        let mut out = self.open_write(SYSINFO_PATH)?;
        for (k, v) in &entries {
            writeln!(out, "{}: {}", k, v)?;
        }
        out.flush()?;

        log::debug!("Device sysinfo {} = {:?}", key, value);
        Ok(())
    }
}

/// Connects to devices laid out as `<root>/<host>/`
pub struct DirectoryConnector {
    root: PathBuf,
}

impl DirectoryConnector {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }
}

impl DeviceConnector for DirectoryConnector {
    fn connect(&self, host: &str) -> Result<Box<dyn DeviceConnection>> {
        let device_root = self.root.join(host);
        if host.is_empty() || host.contains(['/', '\\']) || !device_root.is_dir() {
            bail!("Device not found: {:?} under {:?}", host, self.root);
        }
        Ok(Box::new(MountedDevice::new(device_root)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_then_read() {
        let dir = TempDir::new().unwrap();
        let device = MountedDevice::new(dir.path().to_path_buf());

        let mut out = device.open_write("/iPod_Control/Music/F00/ABCD.mp3").unwrap();
        out.write_all(b"audio").unwrap();
        drop(out);

        assert!(device.exists("/iPod_Control/Music/F00/ABCD.mp3"));
        let mut content = Vec::new();
        device
            .open_read("/iPod_Control/Music/F00/ABCD.mp3")
            .unwrap()
            .read_to_end(&mut content)
            .unwrap();
        assert_eq!(content, b"audio");

        device.remove("/iPod_Control/Music/F00/ABCD.mp3").unwrap();
        assert!(!device.exists("/iPod_Control/Music/F00/ABCD.mp3"));
    }

    #[test]
    fn test_rejects_escaping_paths() {
        let dir = TempDir::new().unwrap();
        let device = MountedDevice::new(dir.path().to_path_buf());

        assert!(device.open_write("/../outside").is_err());
        assert!(!device.exists("/iPod_Control/../../etc/passwd"));
    }

    #[test]
    fn test_music_dir_count() {
        let dir = TempDir::new().unwrap();
        let device = MountedDevice::new(dir.path().to_path_buf());
        assert_eq!(device.music_dir_count(), 0);

        for name in ["F00", "F01", "F02", "Other"] {
            fs::create_dir_all(dir.path().join("iPod_Control/Music").join(name)).unwrap();
        }
        assert_eq!(device.music_dir_count(), 3);
    }

    #[test]
    fn test_sysinfo_preserves_other_keys() {
        let dir = TempDir::new().unwrap();
        let device = MountedDevice::new(dir.path().to_path_buf());
        assert_eq!(device.sysinfo("FirewireGuid").unwrap(), None);

        device.set_sysinfo("ModelNumStr", Some("MA450")).unwrap();
        device.set_sysinfo("FirewireGuid", Some("host-1")).unwrap();
        assert_eq!(device.sysinfo("FirewireGuid").unwrap().as_deref(), Some("host-1"));

        device.set_sysinfo("FirewireGuid", None).unwrap();
        assert_eq!(device.sysinfo("FirewireGuid").unwrap(), None);
        assert_eq!(device.sysinfo("ModelNumStr").unwrap().as_deref(), Some("MA450"));
    }

    #[test]
    fn test_connector() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("phone")).unwrap();
        let connector = DirectoryConnector::new(dir.path().to_path_buf());

        assert!(connector.connect("phone").is_ok());
        assert!(connector.connect("missing").is_err());
        assert!(connector.connect("../phone").is_err());
    }
}
