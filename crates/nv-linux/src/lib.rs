use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use log::debug;

use nv_core::{NvError, NvResult, StorageKind, StorageOp};
use nv_hal::SectionDevice;

pub mod lock;
pub use lock::{FlockGuard, FlockLock};

pub(crate) fn map_io(op: StorageOp, section: &str, e: io::Error) -> NvError {
    let kind = match e.kind() {
        io::ErrorKind::NotFound => StorageKind::NotFound,
        io::ErrorKind::PermissionDenied => StorageKind::PermissionDenied,
        io::ErrorKind::Interrupted => StorageKind::Interrupted,
        _ if e.raw_os_error() == Some(libc::ENOSPC) => StorageKind::NoSpace,
        _ => StorageKind::Other,
    };
    debug!("{}: {:?} failed: {}", section, op, e);
    NvError::storage(op, section, kind)
}

/// `<path><suffix>` next to the section file.
pub(crate) fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

/// Sections are plain files; the section string is the file path.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileDevice;

impl FileDevice {
    pub fn new() -> Self {
        Self
    }

    fn write_tmp(tmp_path: &Path, section: &str, data: &[u8]) -> NvResult<()> {
        let mut file = OpenOptions::new()
            .write(true).create(true).truncate(true)
            .open(tmp_path).map_err(|e| map_io(StorageOp::Write, section, e))?;

        file.write_all(data).map_err(|e| map_io(StorageOp::Write, section, e))?;

        // FSYNC before the rename makes the new contents visible
        file.sync_all().map_err(|e| map_io(StorageOp::Sync, section, e))
    }
}

impl SectionDevice for FileDevice {
    fn read(&self, section: &str) -> NvResult<Option<Vec<u8>>> {
        match fs::read(section) {
            Ok(buf) => Ok(Some(buf)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(map_io(StorageOp::Read, section, e)),
        }
    }

    fn write(&mut self, section: &str, data: &[u8]) -> NvResult<()> {
        let path = Path::new(section);
        let tmp_path = sibling(path, ".tmp");
        let parent = path.parent().filter(|p| !p.as_os_str().is_empty());

        if let Some(dir) = parent {
            fs::create_dir_all(dir).map_err(|e| map_io(StorageOp::Write, section, e))?;
        }

        // 1. Write + fsync .tmp; the live section is not opened at all
        if let Err(e) = Self::write_tmp(&tmp_path, section, data) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e);
        }

        // 2. Rename (Atomic)
        if let Err(e) = fs::rename(&tmp_path, path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(map_io(StorageOp::Rename, section, e));
        }

        // 3. Sync parent dir so the rename itself is durable
        let dir = parent.unwrap_or(Path::new("."));
        File::open(dir)
            .and_then(|f| f.sync_all())
            .map_err(|e| map_io(StorageOp::Sync, section, e))?;

        debug!("{}: wrote {} bytes", section, data.len());
        Ok(())
    }
}
