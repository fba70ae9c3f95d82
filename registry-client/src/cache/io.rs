use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Filesystem operations used by the cache store.
///
/// Every write replaces the target in one step so a reader never sees a
/// half-written file; the store builds its two-file protocol on top.
pub trait CacheIo {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    fn write_atomic(&self, path: &Path, data: &[u8]) -> io::Result<()>;

    /// Remove a file. A missing file is not an error.
    fn remove(&self, path: &Path) -> io::Result<()>;

    fn exists(&self, path: &Path) -> bool;

    fn copy(&self, from: &Path, to: &Path) -> io::Result<()> {
        let data = self.read(from)?;
        self.write_atomic(to, &data)
    }
}

/// The real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdIo;

impl CacheIo for StdIo {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(path)
    }

    fn write_atomic(&self, path: &Path, data: &[u8]) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let tmp = tmp_path(path);
        let result = (|| {
            let mut file = File::create(&tmp)?;
            file.write_all(data)?;
            file.sync_all()?;
            fs::rename(&tmp, path)
        })();

        if result.is_err() {
            let _ = fs::remove_file(&tmp);
        }
        result?;

        if let Some(parent) = path.parent() {
            if let Ok(dir) = File::open(parent) {
                let _ = dir.sync_all();
            }
        }
        Ok(())
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        match fs::remove_file(path) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }

    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(format!(".tmp.{}", std::process::id()));
    path.with_file_name(name)
}
