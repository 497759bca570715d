//! A scoped, move-only token returned by `Database::start_undo_session`.
//!
//! Rust's ordinary move semantics already give this the behavior the
//! original hand-wrote a move-assignment operator for: a `Session` is
//! not `Copy` or `Clone`, so reassigning a `let` binding runs the old
//! value's `Drop` (undoing it, if still armed) before the new value's
//! fields take its place — no custom assignment code is needed here.

use crate::database::Database;
use crate::engine::Engine;
use crate::error::CResult;

pub struct Session<'db, E: Engine> {
    database: &'db mut Database<E>,
    revision: i64,
    armed: bool,
}

impl<'db, E: Engine> Session<'db, E> {
    pub(crate) fn armed(database: &'db mut Database<E>, revision: u64) -> Self {
        Self { database, revision: revision as i64, armed: true }
    }

    pub(crate) fn disarmed(database: &'db mut Database<E>) -> Self {
        Self { database, revision: -1, armed: false }
    }

    /// The revision this session was minted with, or -1 if the session
    /// was opened disabled.
    pub fn revision(&self) -> i64 {
        self.revision
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Access to the owning database, for performing the mutations this
    /// session's scope should cover.
    pub fn database(&mut self) -> &mut Database<E> {
        self.database
    }

    /// Disarms the session: its effect becomes permanent (at least
    /// until an outer session undoes or squashes it away).
    pub fn push(mut self) {
        self.armed = false;
    }

    /// Explicitly undoes this session's effect now, rather than waiting
    /// for drop.
    pub fn undo(mut self) -> CResult<()> {
        if !self.armed {
            return Ok(());
        }
        self.armed = false;
        self.database.undo()
    }

    /// Merges this session into the one below it on the stack.
    pub fn squash(mut self) -> CResult<()> {
        self.armed = false;
        self.database.squash()
    }
}

impl<E: Engine> Drop for Session<'_, E> {
    fn drop(&mut self) {
        if self.armed {
            if let Err(err) = self.database.undo() {
                log::error!("failed to undo session at revision {}: {}", self.revision, err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Options;
    use crate::engine::MemoryEngine;

    fn db() -> Database<MemoryEngine> {
        Database::new(MemoryEngine::new(), Options::default())
    }

    #[test]
    fn drop_without_push_undoes() -> CResult<()> {
        let mut d = db();
        {
            let mut s = d.start_undo_session(true);
            s.database().put(b"a", vec![1])?;
        }
        assert_eq!(d.get(b"a")?, None);
        Ok(())
    }

    #[test]
    fn push_makes_effect_permanent() -> CResult<()> {
        let mut d = db();
        {
            let mut s = d.start_undo_session(true);
            s.database().put(b"a", vec![1])?;
            s.push();
        }
        assert_eq!(d.get(b"a")?, Some(vec![1]));
        Ok(())
    }

    #[test]
    fn disabled_session_never_undoes() -> CResult<()> {
        let mut d = db();
        {
            let mut s = d.start_undo_session(false);
            assert_eq!(s.revision(), -1);
            assert!(!s.is_armed());
            s.database().put(b"a", vec![1])?;
        }
        assert_eq!(d.get(b"a")?, Some(vec![1]));
        Ok(())
    }
}
