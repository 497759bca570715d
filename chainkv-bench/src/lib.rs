//! A database-agnostic benchmark facade, so that a throughput harness
//! can drive any backend that implements `put`/`swap`/`write` without
//! knowing anything about undo sessions or storage engines.

use byteorder::{BigEndian, ByteOrder};
use chainkv::backend::Options;
use chainkv::database::Database;
use chainkv::engine::Engine;

/// Implemented by a database under benchmark. `put` and `swap` are the
/// only mutations the workload generator needs; `write` is a hook for
/// backends that buffer writes and need an explicit flush point.
pub trait AbstractDatabase {
    fn put(&mut self, key: u64, value: Vec<u8>);
    fn swap(&mut self, key_a: u64, key_b: u64);
    fn write(&mut self);
}

fn encode_key(key: u64) -> [u8; 8] {
    let mut buf = [0u8; 8];
    BigEndian::write_u64(&mut buf, key);
    buf
}

/// Adapts `chainkv::Database` to the benchmark facade. Keys are encoded
/// big-endian so that numeric order matches byte order, keeping scans
/// meaningful if a benchmark ever wants to range over the key space.
pub struct ChainkvDatabase<E: Engine> {
    db: Database<E>,
}

impl<E: Engine> ChainkvDatabase<E> {
    pub fn new(engine: E, options: Options) -> Self {
        Self { db: Database::new(engine, options) }
    }

    pub fn inner(&mut self) -> &mut Database<E> {
        &mut self.db
    }
}

impl<E: Engine> AbstractDatabase for ChainkvDatabase<E> {
    fn put(&mut self, key: u64, value: Vec<u8>) {
        self.db.put(&encode_key(key), value).expect("put should not fail in benchmark harness");
    }

    fn swap(&mut self, key_a: u64, key_b: u64) {
        let a = encode_key(key_a);
        let b = encode_key(key_b);
        let value_a = self.db.get(&a).expect("get should not fail").unwrap_or_default();
        let value_b = self.db.get(&b).expect("get should not fail").unwrap_or_default();
        self.db.put(&a, value_b).expect("put should not fail");
        self.db.put(&b, value_a).expect("put should not fail");
    }

    fn write(&mut self) {
        self.db.write().expect("write should not fail in benchmark harness");
    }
}
