use std::path::PathBuf;

use super::log::{KeyDir, Log};
use super::{Engine, Status};
use crate::error::{CResult, Error};

/// A log-structured key-value engine, appending writes to a single file
/// and keeping an in-memory index (the keydir) of key to file position.
/// All live keys must fit in memory. Deletes append a tombstone; stale
/// entries are reclaimed by [`LsmEngine::compact`].
///
/// Simplifications relative to a production LSM store: a single
/// append-only file rather than multiple size-bounded segments (so
/// compaction rewrites the whole file), no hint files (the log itself is
/// scanned on open to rebuild the keydir), and no per-entry checksums.
///
/// Entry format:
///
/// - Key length as big-endian u32.
/// - Value length as big-endian i32, or -1 for tombstones.
/// - Key as raw bytes (max 2 GB).
/// - Value as raw bytes (max 2 GB).
pub struct LsmEngine {
    log: Log,
    keydir: KeyDir,
}

impl LsmEngine {
    /// Opens or creates an engine backed by the file at `path`.
    pub fn new(path: PathBuf) -> CResult<Self> {
        Self::new_with_lock(path, true)
    }

    pub fn new_with_lock(path: PathBuf, try_lock: bool) -> CResult<Self> {
        let mut log = Log::new_with_lock(path, try_lock)?;
        let keydir = log.build_keydir()?;
        Ok(Self { log, keydir })
    }

    /// Opens an engine and compacts it immediately if the fraction of
    /// garbage on disk is at or above `garbage_ratio_threshold`.
    pub fn new_compact(path: PathBuf, garbage_ratio_threshold: f64) -> CResult<Self> {
        let mut s = Self::new(path)?;

        let status = s.status()?;
        if status.total_disk_size > 0 {
            let garbage_ratio = status.garbage_disk_size as f64 / status.total_disk_size as f64;
            if status.garbage_disk_size > 0 && garbage_ratio >= garbage_ratio_threshold {
                log::info!(
                    "compacting {} ({:.0}% garbage of {} bytes)",
                    s.log.path.display(),
                    garbage_ratio * 100.0,
                    status.total_disk_size
                );
                s.compact()?;
            }
        }

        Ok(s)
    }

    pub fn path(&self) -> &std::path::Path {
        &self.log.path
    }

    /// Rewrites the log to contain only live entries, in key order, and
    /// swaps it in for the current log file.
    pub fn compact(&mut self) -> CResult<()> {
        let mut tmp_path = self.log.path.clone();
        tmp_path.set_extension("compact");

        let (mut new_log, new_keydir) = self.write_log(tmp_path)?;

        std::fs::rename(&new_log.path, &self.log.path).map_err(|err| {
            Error::Backend(format!(
                "compaction rename from {:?} to {:?} failed: {}",
                new_log.path, self.log.path, err
            ))
        })?;
        new_log.path = self.log.path.clone();

        self.log = new_log;
        self.keydir = new_keydir;
        Ok(())
    }

    fn write_log(&mut self, path: PathBuf) -> CResult<(Log, KeyDir)> {
        let mut new_keydir = KeyDir::new();
        let mut new_log = Log::new(path)?;
        new_log.file.set_len(0)?;
        for (key, (value_pos, value_len)) in self.keydir.iter() {
            let value = self.log.read_value(*value_pos, *value_len)?;
            let (pos, len) = new_log.write_entry(key, Some(&value))?;
            new_keydir.insert(key.clone(), (pos + len as u64 - *value_len as u64, *value_len));
        }
        Ok((new_log, new_keydir))
    }
}

impl std::fmt::Display for LsmEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "lsm")
    }
}

impl Engine for LsmEngine {
    type ScanIterator<'a> = LsmScanIterator<'a>;

    fn set(&mut self, key: &[u8], value: Vec<u8>) -> CResult<()> {
        let (pos, len) = self.log.write_entry(key, Some(&value))?;
        let value_len = value.len() as u32;
        self.keydir
            .insert(key.to_vec(), (pos + len as u64 - value_len as u64, value_len));
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> CResult<()> {
        self.log.write_entry(key, None)?;
        self.keydir.remove(key);
        Ok(())
    }

    fn get(&mut self, key: &[u8]) -> CResult<Option<Vec<u8>>> {
        match self.keydir.get(key) {
            Some((value_pos, value_len)) => Ok(Some(self.log.read_value(*value_pos, *value_len)?)),
            None => Ok(None),
        }
    }

    fn flush(&mut self) -> CResult<()> {
        Ok(self.log.file.sync_all()?)
    }

    fn scan(&mut self, range: impl std::ops::RangeBounds<Vec<u8>>) -> Self::ScanIterator<'_>
    where
        Self: Sized,
    {
        LsmScanIterator { inner: self.keydir.range(range), log: &mut self.log }
    }

    fn status(&mut self) -> CResult<Status> {
        let keys = self.keydir.len() as u64;
        let size = self
            .keydir
            .iter()
            .fold(0, |size, (key, (_, value_len))| size + key.len() as u64 + *value_len as u64);
        let total_disk_size = self.log.file.metadata()?.len();
        let live_disk_size = size + 8 * keys; // account for length prefixes
        let garbage_disk_size = total_disk_size.saturating_sub(live_disk_size);
        Ok(Status {
            name: self.to_string(),
            keys,
            size,
            total_disk_size,
            live_disk_size,
            garbage_disk_size,
        })
    }
}

/// Flushes on drop, on a best-effort basis; callers that need to observe
/// flush failures should call [`Engine::flush`] explicitly beforehand.
impl Drop for LsmEngine {
    fn drop(&mut self) {
        if let Err(err) = self.flush() {
            log::error!("failed to flush log on drop: {err}");
        }
    }
}

pub struct LsmScanIterator<'a> {
    inner: std::collections::btree_map::Range<'a, Vec<u8>, (u64, u32)>,
    log: &'a mut Log,
}

impl LsmScanIterator<'_> {
    fn map(&mut self, item: (&Vec<u8>, &(u64, u32))) -> <Self as Iterator>::Item {
        let (key, (value_pos, value_len)) = item;
        Ok((key.clone(), self.log.read_value(*value_pos, *value_len)?))
    }
}

impl Iterator for LsmScanIterator<'_> {
    type Item = CResult<(Vec<u8>, Vec<u8>)>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|item| self.map(item))
    }
}

impl DoubleEndedIterator for LsmScanIterator<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|item| self.map(item))
    }
}
