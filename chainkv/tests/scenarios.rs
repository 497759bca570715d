//! The end-to-end scenarios from the design document, run literally
//! against an in-memory database.

use chainkv::backend::Options;
use chainkv::database::Database;
use chainkv::engine::MemoryEngine;
use chainkv::error::CResult;
use std::collections::BTreeMap;

fn db() -> Database<MemoryEngine> {
    Database::new(MemoryEngine::new(), Options::default())
}

fn letters(from: u8, to: u8) -> Vec<(Vec<u8>, Vec<u8>)> {
    (from..=to).map(|c| (vec![c], vec![c.to_ascii_uppercase()])).collect()
}

fn as_string_map(map: BTreeMap<Vec<u8>, Vec<u8>>) -> BTreeMap<String, String> {
    map.into_iter()
        .map(|(k, v)| (String::from_utf8(k).unwrap(), String::from_utf8(v).unwrap()))
        .collect()
}

#[test]
fn s1_create_and_undo() -> CResult<()> {
    let mut d = db();
    {
        let mut s = d.start_undo_session(true);
        for (k, v) in letters(b'a', b'j') {
            s.database().put(&k, v)?;
        }
        s.database().write()?;
        let map = as_string_map(s.database().as_map()?);
        assert_eq!(map.len(), 10);
        assert_eq!(map.get("a"), Some(&"A".to_string()));
        assert_eq!(map.get("j"), Some(&"J".to_string()));
    }
    d.write()?;
    assert!(d.as_map()?.is_empty());
    Ok(())
}

#[test]
fn s2_prefilled_nested_create_then_undo() -> CResult<()> {
    let mut d = db();
    for (k, v) in letters(b'a', b'j') {
        d.put(&k, v)?;
    }
    {
        let mut s = d.start_undo_session(true);
        for (k, v) in letters(b'k', b't') {
            s.database().put(&k, v)?;
        }
        assert_eq!(s.database().as_map()?.len(), 20);
    }
    assert_eq!(d.as_map()?.len(), 10);
    assert_eq!(d.get(b"a")?, Some(b"A".to_vec()));
    assert_eq!(d.get(b"j")?, Some(b"J".to_vec()));
    Ok(())
}

#[test]
fn s3_modify_then_undo() -> CResult<()> {
    let mut d = db();
    for (k, v) in letters(b'a', b'j') {
        d.put(&k, v)?;
    }
    {
        let mut s = d.start_undo_session(true);
        for c in b'a'..=b'j' {
            s.database().put(&[c], vec![c.to_ascii_uppercase() + 10])?;
        }
    }
    for c in b'a'..=b'j' {
        assert_eq!(d.get(&[c])?, Some(vec![c.to_ascii_uppercase()]));
    }
    Ok(())
}

#[test]
fn s4_remove_then_undo() -> CResult<()> {
    let mut d = db();
    for (k, v) in letters(b'a', b'j') {
        d.put(&k, v)?;
    }
    {
        let mut s = d.start_undo_session(true);
        for c in b'a'..=b'j' {
            s.database().remove(&[c])?;
        }
        assert!(s.database().as_map()?.is_empty());
    }
    assert_eq!(d.as_map()?.len(), 10);
    Ok(())
}

#[test]
fn s5_two_sessions_undo_all() -> CResult<()> {
    let mut d = db();
    {
        let mut s0 = d.start_undo_session(true);
        for (k, v) in letters(b'a', b'j') {
            s0.database().put(&k, v)?;
        }
        {
            let mut s1 = s0.database().start_undo_session(true);
            for (k, v) in letters(b'k', b't') {
                s1.database().put(&k, v)?;
            }
            s1.push();
        }
        s0.push();
    }
    assert_eq!(d.as_map()?.len(), 20);
    d.undo_all()?;
    assert!(d.as_map()?.is_empty());
    Ok(())
}

#[test]
fn s6_squash_of_two_creates() -> CResult<()> {
    let mut d = db();
    let mut s0 = d.start_undo_session(true);
    for (k, v) in letters(b'a', b'j') {
        s0.database().put(&k, v)?;
    }
    {
        let mut s1 = s0.database().start_undo_session(true);
        for (k, v) in letters(b'k', b't') {
            s1.database().put(&k, v)?;
        }
        assert_eq!(s1.database().stack().last().unwrap().new_keys.len(), 10);
        s1.push();
    }
    assert_eq!(s0.database().stack()[0].new_keys.len(), 10);
    s0.database().squash()?;
    assert_eq!(s0.database().stack().len(), 1);
    assert_eq!(s0.database().stack()[0].new_keys.len(), 20);
    let live_before_drop = s0.database().as_map()?.len();
    assert_eq!(live_before_drop, 20);
    drop(s0);
    assert!(d.as_map()?.is_empty());
    Ok(())
}

#[test]
fn s7_squash_of_create_then_modify() -> CResult<()> {
    let mut d = db();
    let mut s0 = d.start_undo_session(true);
    for (k, v) in letters(b'a', b'j') {
        s0.database().put(&k, v)?;
    }
    {
        let mut s1 = s0.database().start_undo_session(true);
        for c in b'a'..=b'e' {
            s1.database().put(&[c], vec![c.to_ascii_uppercase() + 10])?;
        }
        s1.push();
    }
    s0.database().squash()?;
    let top = &s0.database().stack()[0];
    assert_eq!(top.new_keys.len(), 10);
    assert!(top.modified_values.is_empty());
    drop(s0);
    assert!(d.as_map()?.is_empty());
    Ok(())
}

#[test]
fn s8_squash_of_two_removes_on_prefilled_state() -> CResult<()> {
    let mut d = db();
    for (k, v) in letters(b'a', b'j') {
        d.put(&k, v)?;
    }
    let mut s0 = d.start_undo_session(true);
    for c in b'a'..=b'e' {
        s0.database().remove(&[c])?;
    }
    {
        let mut s1 = s0.database().start_undo_session(true);
        for c in b'f'..=b'i' {
            s1.database().remove(&[c])?;
        }
        s1.push();
    }
    s0.database().squash()?;
    let top = &s0.database().stack()[0];
    assert_eq!(top.removed_values.len(), 9);
    drop(s0);
    assert_eq!(d.as_map()?.len(), 10);
    Ok(())
}
