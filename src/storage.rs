use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use serde::Serialize;
use serde_json::Value;

use crate::event::Event;
use crate::Error;

/// Read a stored collection as raw JSON records.
///
/// Records are returned unparsed so callers can skip malformed entries one
/// by one instead of rejecting the whole file. A file whose top level is not
/// an array is an error.
pub fn read_collection(path: &Path) -> Result<Vec<Value>, Error> {
    let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    let value: Value = serde_json::from_str(&content).map_err(|source| Error::Json {
        path: path.to_path_buf(),
        source,
    })?;
    match value {
        Value::Array(items) => Ok(items),
        _ => Err(Error::NotACollection(path.to_path_buf())),
    }
}

/// Like [`read_collection`], but a missing file reads as `None`.
pub fn read_collection_if_exists(path: &Path) -> Result<Option<Vec<Value>>, Error> {
    if !path.exists() {
        return Ok(None);
    }
    read_collection(path).map(Some)
}

/// Replace the file at `path` with `events` as a pretty-printed JSON array.
pub fn write_collection(path: &Path, events: &[Event]) -> Result<(), Error> {
    write_json(path, &events)
}

/// Summary written next to the current collection.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionIndex<'a> {
    pub event_count: usize,
    pub links: Vec<&'a str>,
}

pub fn write_index(path: &Path, events: &[Event]) -> Result<(), Error> {
    let index = CollectionIndex {
        event_count: events.len(),
        links: events.iter().map(|e| e.link.as_str()).collect(),
    };
    write_json(path, &index)
}

/// Whole-file replace: write a sibling temp file, then rename over `path`.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), Error> {
    let json = serde_json::to_string_pretty(value).map_err(|source| Error::Json {
        path: path.to_path_buf(),
        source,
    })?;
    write_text(path, &json)
}

pub fn write_text(path: &Path, content: &str) -> Result<(), Error> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;
    }
    let tmp = temp_path(path);
    let mut file = File::create(&tmp).map_err(|e| Error::io(&tmp, e))?;
    file.write_all(content.as_bytes())
        .and_then(|()| file.sync_all())
        .map_err(|e| Error::io(&tmp, e))?;
    fs::rename(&tmp, path).map_err(|e| Error::io(path, e))
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Age after which a lock file is taken over even if its holder looks alive.
pub const DEFAULT_LOCK_MAX_AGE: Duration = Duration::from_secs(6 * 60 * 60);

/// Exclusive marker file that keeps two runs from writing at once.
///
/// The file records the holder's PID. A lock whose holder is gone (killed
/// before it could clean up) or that is older than the maximum age is stale
/// and gets replaced. Released (deleted) on drop.
#[derive(Debug)]
pub struct RunLock {
    path: PathBuf,
}

impl RunLock {
    pub fn acquire(path: impl Into<PathBuf>) -> Result<Self, Error> {
        Self::acquire_with_max_age(path, DEFAULT_LOCK_MAX_AGE)
    }

    pub fn acquire_with_max_age(path: impl Into<PathBuf>, max_age: Duration) -> Result<Self, Error> {
        let path = path.into();
        match Self::create(path) {
            Err(Error::Locked(path)) if is_stale(&path, max_age) => {
                tracing::warn!(path = %path.display(), "replacing stale run lock");
                match fs::remove_file(&path) {
                    Ok(()) => {}
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                    Err(e) => return Err(Error::io(path, e)),
                }
                Self::create(path)
            }
            other => other,
        }
    }

    fn create(path: PathBuf) -> Result<Self, Error> {
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                let _ = writeln!(file, "{}", std::process::id());
                Ok(Self { path })
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Err(Error::Locked(path)),
            Err(e) => Err(Error::io(path, e)),
        }
    }
}

fn is_stale(path: &Path, max_age: Duration) -> bool {
    let holder = fs::read_to_string(path)
        .ok()
        .and_then(|s| s.trim().parse::<u32>().ok());
    if holder.and_then(process_alive) == Some(false) {
        return true;
    }
    fs::metadata(path)
        .and_then(|m| m.modified())
        .ok()
        .and_then(|modified| SystemTime::now().duration_since(modified).ok())
        .is_some_and(|age| age > max_age)
}

/// Whether `pid` names a running process; `None` where that cannot be told.
fn process_alive(pid: u32) -> Option<bool> {
    let proc = Path::new("/proc");
    if !proc.join("self").exists() {
        return None;
    }
    Some(proc.join(pid.to_string()).exists())
}

impl Drop for RunLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            tracing::warn!(path = %self.path.display(), error = %e, "could not remove run lock");
        }
    }
}
