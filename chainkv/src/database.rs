//! The heart of the system: owns a `Backend`, owns the stack of
//! `UndoRecord`s for currently open sessions, and owns the monotonic
//! revision counter. Exposes the mutating API, the session API, and the
//! read-through API.

use std::collections::BTreeMap;

use crate::backend::{Backend, Options};
use crate::engine::Engine;
use crate::error::{CResult, Error};
use crate::session::Session;
use crate::undo::{squash_into, UndoRecord};

pub struct Database<E: Engine> {
    backend: Backend<E>,
    stack: Vec<UndoRecord>,
    revision: u64,
}

impl<E: Engine> Database<E> {
    pub fn new(engine: E, options: Options) -> Self {
        Self { backend: Backend::new(engine, options), stack: Vec::new(), revision: 0 }
    }

    /// The stack of open sessions, bottom (oldest) first.
    pub fn stack(&self) -> &[UndoRecord] {
        &self.stack
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    // --- Mutating API -----------------------------------------------

    /// Sets `key` to `value`. If a session is open, records whatever
    /// pre-image is needed to undo this write.
    pub fn put(&mut self, key: &[u8], value: Vec<u8>) -> CResult<()> {
        let existing = self.backend.get(key)?;
        let value_len = value.len();
        self.backend.put(key, value)?;
        if let Some(top) = self.stack.last_mut() {
            top.record_put(key, existing);
        }
        log::trace!("put {value_len} bytes at key of length {}", key.len());
        Ok(())
    }

    /// Removes `key`. Fails if a session is open and `key` was already
    /// removed within that same session — a double-remove in one
    /// session is a defect, not a no-op.
    pub fn remove(&mut self, key: &[u8]) -> CResult<()> {
        if let Some(top) = self.stack.last() {
            if top.removed_values.contains_key(key) {
                return Err(Error::SessionLogic(format!(
                    "key already removed in this session (len {})",
                    key.len()
                )));
            }
        }
        let Some(current) = self.backend.get(key)? else {
            return Ok(());
        };
        self.backend.remove(key)?;
        if let Some(top) = self.stack.last_mut() {
            top.record_remove(key, current);
        }
        log::trace!("removed key of length {}", key.len());
        Ok(())
    }

    /// Enqueues a put into the backend's pending write batch. Like
    /// `put`, records whatever pre-image an open session needs to undo
    /// this write, but the write itself is not visible to reads until
    /// `write` is called.
    pub fn put_batch(&mut self, key: &[u8], value: Vec<u8>) -> CResult<()> {
        let existing = self.backend.get(key)?;
        self.backend.put_batch(key, value);
        if let Some(top) = self.stack.last_mut() {
            top.record_put(key, existing);
        }
        Ok(())
    }

    /// Enqueues a remove into the backend's pending write batch. Same
    /// double-remove rejection as `remove`; the delete is not visible
    /// to reads until `write` is called.
    pub fn remove_batch(&mut self, key: &[u8]) -> CResult<()> {
        if let Some(top) = self.stack.last() {
            if top.removed_values.contains_key(key) {
                return Err(Error::SessionLogic(format!(
                    "key already removed in this session (len {})",
                    key.len()
                )));
            }
        }
        let Some(current) = self.backend.get(key)? else {
            return Ok(());
        };
        self.backend.remove_batch(key);
        if let Some(top) = self.stack.last_mut() {
            top.record_remove(key, current);
        }
        Ok(())
    }

    /// Flushes the backend's pending batch and fsyncs.
    pub fn write(&mut self) -> CResult<()> {
        self.backend.write_batch()?;
        self.backend.flush()
    }

    // --- Read API ------------------------------------------------------

    pub fn get(&mut self, key: &[u8]) -> CResult<Option<Vec<u8>>> {
        self.backend.get(key)
    }

    pub fn exists(&mut self, key: &[u8]) -> CResult<bool> {
        self.backend.exists(key)
    }

    pub fn as_map(&mut self) -> CResult<BTreeMap<Vec<u8>, Vec<u8>>> {
        self.backend.iterate_as_map()
    }

    // --- Session API -----------------------------------------------

    /// Opens a session. If `enabled` is false, returns a disarmed
    /// session that will have no effect on `undo`/`drop` — used when a
    /// caller wants the RAII shape without the bookkeeping overhead.
    pub fn start_undo_session(&mut self, enabled: bool) -> Session<'_, E> {
        if !enabled {
            return Session::disarmed(self);
        }
        self.revision += 1;
        let revision = self.revision;
        self.stack.push(UndoRecord::new(revision));
        log::debug!("opened session at revision {revision}");
        Session::armed(self, revision)
    }

    /// Reverses the top session's effect on live state and pops it.
    pub fn undo(&mut self) -> CResult<()> {
        let Some(top) = self.stack.pop() else {
            return Ok(());
        };
        for (key, value) in top.removed_values {
            self.backend.put(&key, value)?;
        }
        for (key, value) in top.modified_values {
            self.backend.put(&key, value)?;
        }
        for key in top.new_keys {
            self.backend.remove(&key)?;
        }
        self.revision = self.revision.saturating_sub(1);
        log::debug!("undid session, revision now {}", self.revision);
        Ok(())
    }

    /// Undoes every open session, bottom to top.
    pub fn undo_all(&mut self) -> CResult<()> {
        while !self.stack.is_empty() {
            self.undo()?;
        }
        Ok(())
    }

    /// Discards the entire stack without applying any record. Live
    /// state is left as is; the revision counter is a logical clock and
    /// is not reset.
    pub fn commit(&mut self) {
        log::debug!("committed {} open session(s)", self.stack.len());
        self.stack.clear();
    }

    /// Merges the top two records into one, replacing them with a
    /// single combined record and decrementing the revision counter by
    /// one. A no-op if fewer than two sessions are open.
    pub fn squash(&mut self) -> CResult<()> {
        if self.stack.len() < 2 {
            return Ok(());
        }
        let b = self.stack.pop().expect("len checked above");
        let mut a = self.stack.pop().expect("len checked above");
        squash_into(&mut a, b);
        self.stack.push(a);
        self.revision = self.revision.saturating_sub(1);
        log::debug!("squashed top two sessions, revision now {}", self.revision);
        Ok(())
    }
}
