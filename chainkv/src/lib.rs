//! chainkv is a transactional, undoable key-value store built atop a
//! log-structured append-only engine. It exposes a single-writer
//! interface with nested, revertible sessions: open a session, perform
//! any sequence of puts/removes against live state, then either commit
//! it (make it permanent) or let it fall out of scope (revert exactly
//! the mutations that session performed). Adjacent sessions on the
//! stack can be squashed into one so a run of fine-grained edits becomes
//! a single undo unit.
//!
//! ## Getting started
//!
//! ```rust
//! use chainkv::backend::Options;
//! use chainkv::database::Database;
//! use chainkv::engine::MemoryEngine;
//!
//! fn run() -> chainkv::error::CResult<()> {
//!     let mut db = Database::new(MemoryEngine::new(), Options::default());
//!     db.put(b"a", vec![1])?;
//!
//!     {
//!         let mut session = db.start_undo_session(true);
//!         session.database().put(b"a", vec![2])?;
//!         // session drops here without push(); the put above is undone.
//!     }
//!
//!     assert_eq!(db.get(b"a")?, Some(vec![1]));
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod database;
pub mod datum;
pub mod engine;
pub mod error;
pub mod session;
pub mod undo;
