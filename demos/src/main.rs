use chainkv::backend::Options;
use chainkv::database::Database;
use chainkv::engine::LsmEngine;
use chainkv::error::Error;

fn main() {
    init_logger();

    println!("Hello, chainkv!");
    run().unwrap();
    println!("Bye~");
}

fn init_logger() {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{} [{}] {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                message
            ))
        })
        .level(log::LevelFilter::Info)
        .chain(std::io::stdout())
        .apply()
        .expect("logger should only be initialized once");
}

fn run() -> Result<(), Error> {
    let storage_path = tempfile::tempdir()?.path().join("chainkv.db");
    let engine = LsmEngine::new(storage_path)?;
    let mut db = Database::new(engine, Options::default());

    db.put(b"a", b"A".to_vec())?;
    db.put(b"b", b"B".to_vec())?;
    db.write()?;
    log::info!("pre-fill: {:?}", db.as_map()?);

    {
        let mut session = db.start_undo_session(true);
        session.database().put(b"c", b"C".to_vec())?;
        session.database().remove(b"a")?;
        log::info!("inside session: {:?}", session.database().as_map()?);
        // session drops here without push(); both edits are undone.
    }
    log::info!("after scope exit: {:?}", db.as_map()?);
    assert!(db.get(b"c")?.is_none());
    assert_eq!(db.get(b"a")?, Some(b"A".to_vec()));

    {
        let mut session = db.start_undo_session(true);
        session.database().put(b"c", b"C".to_vec())?;
        session.push(); // keep this edit
    }
    log::info!("after push: {:?}", db.as_map()?);
    assert_eq!(db.get(b"c")?, Some(b"C".to_vec()));

    Ok(())
}
