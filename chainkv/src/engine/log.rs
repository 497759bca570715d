use std::collections::BTreeMap;
use std::io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::PathBuf;

use fs4::FileExt;

use crate::error::{CResult, Error};

/// Maps keys to a value position and length in the log file.
pub(super) type KeyDir = BTreeMap<Vec<u8>, (u64, u32)>;

/// An append-only log file, containing a sequence of key/value entries
/// encoded as:
///
/// - Key length as big-endian u32.
/// - Value length as big-endian i32, or -1 for tombstones.
/// - Key as raw bytes (max 2 GB).
/// - Value as raw bytes (max 2 GB).
pub(super) struct Log {
    pub(super) path: PathBuf,
    pub(super) file: std::fs::File,
}

impl Log {
    /// Opens a log file, or creates one if it does not exist. Takes out
    /// an exclusive lock on the file until it is closed, erroring if the
    /// lock is already held by another process.
    pub(super) fn new(path: PathBuf) -> CResult<Self> {
        Self::new_with_lock(path, true)
    }

    pub(super) fn new_with_lock(path: PathBuf, try_lock: bool) -> CResult<Self> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)
                .map_err(|err| Error::Backend(format!("failed to create {:?}: {}", dir, err)))?;
        }

        let file = std::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(&path)?;

        if try_lock {
            file.try_lock_exclusive()
                .map_err(|err| Error::Backend(format!("failed to lock {:?}: {}", path, err)))?;
        }

        Ok(Self { path, file })
    }

    /// Scans the log file from the beginning and rebuilds the keydir,
    /// used to recover in-memory state when the store is opened. If an
    /// incomplete entry is found at the end of the file — an interrupted
    /// write — the file is truncated to the last complete entry.
    pub(super) fn build_keydir(&mut self) -> CResult<KeyDir> {
        let mut len_buf = [0u8; 4];
        let mut keydir = KeyDir::new();
        let file_len = self.file.metadata()?.len();
        let mut r = BufReader::new(&mut self.file);

        let mut pos = r.seek(SeekFrom::Start(0))?;

        while pos < file_len {
            let mut read_entry = || -> Result<(Vec<u8>, u64, Option<u32>), std::io::Error> {
                r.read_exact(&mut len_buf)?;
                let key_len = u32::from_be_bytes(len_buf);
                r.read_exact(&mut len_buf)?;
                let value_len_or_tombstone = match i32::from_be_bytes(len_buf) {
                    l if l >= 0 => Some(l as u32),
                    _ => None,
                };
                let value_pos = pos + 4 + 4 + key_len as u64;

                let mut key = vec![0; key_len as usize];
                r.read_exact(&mut key)?;

                if let Some(value_len) = value_len_or_tombstone {
                    if value_pos + value_len as u64 > file_len {
                        return Err(std::io::Error::new(
                            std::io::ErrorKind::UnexpectedEof,
                            "value extends beyond end of file",
                        ));
                    }
                    r.seek_relative(value_len as i64)?;
                }

                Ok((key, value_pos, value_len_or_tombstone))
            };

            match read_entry() {
                Ok((key, value_pos, Some(value_len))) => {
                    keydir.insert(key, (value_pos, value_len));
                    pos = value_pos + value_len as u64;
                }
                Ok((key, value_pos, None)) => {
                    keydir.remove(&key);
                    pos = value_pos;
                }
                Err(err) if err.kind() == std::io::ErrorKind::UnexpectedEof => {
                    log::warn!("incomplete log entry at offset {pos}, truncating file");
                    self.file.set_len(pos)?;
                    break;
                }
                Err(err) => return Err(err.into()),
            }
        }

        Ok(keydir)
    }

    /// Reads a value at the given position and length.
    pub(super) fn read_value(&mut self, value_pos: u64, value_len: u32) -> CResult<Vec<u8>> {
        let mut value = vec![0; value_len as usize];
        self.file.seek(SeekFrom::Start(value_pos))?;
        self.file.read_exact(&mut value)?;
        Ok(value)
    }

    /// Appends a key/value entry to the log, using `None` for a
    /// tombstone. Returns the position and total length of the entry.
    pub(super) fn write_entry(&mut self, key: &[u8], value: Option<&[u8]>) -> CResult<(u64, u32)> {
        let key_len = key.len() as u32;
        let value_len = value.map_or(0, |v| v.len() as u32);
        let value_len_or_tombstone = value.map_or(-1, |v| v.len() as i32);
        let len = 4 + 4 + key_len + value_len;

        let pos = self.file.seek(SeekFrom::End(0))?;
        let mut w = BufWriter::with_capacity(len as usize, &mut self.file);
        w.write_all(&key_len.to_be_bytes())?;
        w.write_all(&value_len_or_tombstone.to_be_bytes())?;
        w.write_all(key)?;
        if let Some(value) = value {
            w.write_all(value)?;
        }
        w.flush()?;

        Ok((pos, len))
    }
}
