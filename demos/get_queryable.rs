//! Queries against local queryables, with consolidation and liveliness

use keyrelay::{
    Config, ConsolidationMode, FifoChannel, GetOptions, Query, QueryTarget,
    QueryableOptions, Result, Session,
};
use std::{thread, time::Duration};

fn main() -> Result<()> {
    keyrelay::init_log_from_env();

    println!("Keyrelay Get/Queryable Example");
    println!("==============================");

    let session = Session::open_local(Config::default())?;

    // Answers inline from the querying thread
    let _store = session.declare_queryable_with(
        "store/**",
        |query: Query| {
            println!("  [store] query on {} ({})", query.key_expr(), query.parameters());
            for (key, value) in [("store/a", "1"), ("store/b", "2")] {
                if let Err(err) = query.reply(key, value) {
                    log::warn!("reply failed: {}", err);
                }
            }
        },
        QueryableOptions::default().with_complete(true),
    )?;

    // Answers later from its own thread; the get stays open until the query is dropped
    let cache = session.declare_queryable("store/a", FifoChannel::new(8))?;
    let worker = thread::spawn(move || {
        if let Ok(query) = cache.recv_timeout(Duration::from_secs(1)) {
            let _ = query.reply("store/a", "cached");
        }
    });

    for mode in [ConsolidationMode::None, ConsolidationMode::Latest] {
        println!("\nget store/** with {} consolidation", mode);
        let replies = session.get_with(
            "store/**?verbose=true",
            FifoChannel::new(16),
            GetOptions::default()
                .with_target(QueryTarget::All)
                .with_consolidation(mode)
                .with_timeout(Duration::from_secs(2)),
        )?;
        for reply in replies.iter() {
            if let Ok(sample) = reply.result() {
                println!("  {} = {}", sample.key_expr(), sample.payload().to_string_lossy());
            }
        }
    }
    let _ = worker.join();

    let token = session.liveliness().declare_token("group/member-1")?;
    let alive = session.liveliness().get("group/**", FifoChannel::new(8))?;
    println!("\nAlive tokens:");
    for reply in alive.iter() {
        if let Ok(sample) = reply.result() {
            println!("  {}", sample.key_expr());
        }
    }
    token.undeclare()?;

    session.close()
}
