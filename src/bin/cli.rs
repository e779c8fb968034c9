use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use keyrelay::{
    Config, ConsolidationMode, FifoChannel, GetOptions, KeyExpr, Query, RelayError,
    Result, RingChannel, Session,
};
use std::{
    thread,
    time::{Duration, Instant},
};

fn main() -> Result<()> {
    keyrelay::init_log_from_env();

    let key_arg = |name: &'static str, index: u64| {
        Arg::with_name(name)
            .help("Key expression")
            .required(true)
            .index(index)
    };

    let matches = App::new("keyrelay-cli")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Key expression tools and local pub/sub/query demos")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .subcommand(
            SubCommand::with_name("keyexpr")
                .about("Inspect key expressions")
                .setting(AppSettings::SubcommandRequiredElseHelp)
                .subcommand(
                    SubCommand::with_name("canon")
                        .about("Print the canonical form")
                        .arg(key_arg("key", 1)),
                )
                .subcommand(
                    SubCommand::with_name("includes")
                        .about("Whether LEFT includes every key of RIGHT")
                        .arg(key_arg("left", 1))
                        .arg(key_arg("right", 2)),
                )
                .subcommand(
                    SubCommand::with_name("intersects")
                        .about("Whether LEFT and RIGHT share a key")
                        .arg(key_arg("left", 1))
                        .arg(key_arg("right", 2)),
                )
                .subcommand(
                    SubCommand::with_name("join")
                        .about("Join two expressions with '/'")
                        .arg(key_arg("left", 1))
                        .arg(key_arg("right", 2)),
                ),
        )
        .subcommand(
            SubCommand::with_name("demo")
                .about("Run a local session demo")
                .setting(AppSettings::SubcommandRequiredElseHelp)
                .subcommand(
                    SubCommand::with_name("pubsub")
                        .about("Publish samples to a slow subscriber")
                        .arg(
                            Arg::with_name("channel")
                                .short("c")
                                .long("channel")
                                .value_name("KIND")
                                .help("Subscriber channel")
                                .possible_values(&["ring", "fifo"])
                                .default_value("ring")
                                .takes_value(true),
                        )
                        .arg(
                            Arg::with_name("capacity")
                                .long("capacity")
                                .value_name("N")
                                .help("Channel capacity")
                                .default_value("8")
                                .takes_value(true),
                        )
                        .arg(
                            Arg::with_name("count")
                                .short("n")
                                .long("count")
                                .value_name("N")
                                .help("Samples to publish")
                                .default_value("100")
                                .takes_value(true),
                        ),
                )
                .subcommand(
                    SubCommand::with_name("query")
                        .about("Query two queryables answering the same keys")
                        .arg(
                            Arg::with_name("consolidation")
                                .long("consolidation")
                                .value_name("MODE")
                                .help("none, monotonic, latest or auto")
                                .default_value("auto")
                                .takes_value(true),
                        ),
                ),
        )
        .get_matches();

    match matches.subcommand() {
        ("keyexpr", Some(keyexpr_matches)) => handle_keyexpr_commands(keyexpr_matches),
        ("demo", Some(demo_matches)) => handle_demo_commands(demo_matches),
        _ => {
            println!("Use --help for usage information");
            Ok(())
        }
    }
}

fn key_expr_of(matches: &ArgMatches, name: &str) -> Result<KeyExpr> {
    let raw = matches
        .value_of(name)
        .ok_or_else(|| RelayError::invalid_argument(name, "missing key expression"))?;
    KeyExpr::autocanonize(raw)
}

fn number_of(matches: &ArgMatches, name: &str) -> Result<usize> {
    matches
        .value_of(name)
        .unwrap_or_default()
        .parse()
        .map_err(|_| RelayError::invalid_argument(name, "expected a number"))
}

fn handle_keyexpr_commands(matches: &ArgMatches) -> Result<()> {
    match matches.subcommand() {
        ("canon", Some(m)) => {
            println!("{}", key_expr_of(m, "key")?);
        }
        ("includes", Some(m)) => {
            let left = key_expr_of(m, "left")?;
            let right = key_expr_of(m, "right")?;
            println!("{} includes {}: {}", left, right, left.includes(&right));
        }
        ("intersects", Some(m)) => {
            let left = key_expr_of(m, "left")?;
            let right = key_expr_of(m, "right")?;
            println!("{} intersects {}: {}", left, right, left.intersects(&right));
        }
        ("join", Some(m)) => {
            let left = key_expr_of(m, "left")?;
            let right = m.value_of("right").unwrap_or_default();
            println!("{}", left.join(right)?);
        }
        _ => println!("Use 'keyexpr --help' for usage information"),
    }
    Ok(())
}

fn handle_demo_commands(matches: &ArgMatches) -> Result<()> {
    match matches.subcommand() {
        ("pubsub", Some(m)) => run_pubsub_demo(
            m.value_of("channel") == Some("fifo"),
            number_of(m, "capacity")?,
            number_of(m, "count")?,
        ),
        ("query", Some(m)) => {
            let mode: ConsolidationMode = m.value_of("consolidation").unwrap_or("auto").parse()?;
            run_query_demo(mode)
        }
        _ => {
            println!("Use 'demo --help' for usage information");
            Ok(())
        }
    }
}

fn run_pubsub_demo(fifo: bool, capacity: usize, count: usize) -> Result<()> {
    let session = Session::open_local(Config::default())?;
    println!(
        "Publishing {} samples through a {} channel of capacity {}",
        count,
        if fifo { "fifo" } else { "ring" },
        capacity
    );

    let start = Instant::now();
    let received = if fifo {
        let subscriber = session.declare_subscriber("demo/**", FifoChannel::new(capacity))?;
        let publisher = session.declare_publisher("demo/counter")?;
        let reader = thread::spawn(move || {
            let mut received = 0;
            while subscriber.recv_timeout(Duration::from_millis(200)).is_ok() {
                received += 1;
            }
            received
        });
        for i in 0..count {
            publisher.put(i.to_string())?;
        }
        reader.join().unwrap_or(0)
    } else {
        let subscriber = session.declare_subscriber("demo/**", RingChannel::new(capacity))?;
        let publisher = session.declare_publisher("demo/counter")?;
        for i in 0..count {
            publisher.put(i.to_string())?;
        }
        let last = subscriber.try_iter().fold(None, |_, sample| Some(sample));
        if let Some(sample) = &last {
            println!("  Newest sample: {}", sample.payload().to_string_lossy());
        }
        subscriber.stats().received as usize
    };
    let elapsed = start.elapsed();

    println!("\nResults:");
    println!("  Received: {}/{}", received, count);
    println!("  Total time: {:.2}ms", elapsed.as_secs_f64() * 1000.0);
    println!("  Publications: {}", session.stats().total_publications());
    session.close()
}

fn run_query_demo(mode: ConsolidationMode) -> Result<()> {
    let session = Session::open_local(Config::default())?;
    let _fast = session.declare_queryable("demo/store/**", |query: Query| {
        for key in ["demo/store/a", "demo/store/b"] {
            if let Err(err) = query.reply(key, "from fast") {
                log::warn!("reply failed: {}", err);
            }
        }
    })?;
    let _slow = session.declare_queryable("demo/store/**", |query: Query| {
        if let Err(err) = query.reply("demo/store/a", "from slow") {
            log::warn!("reply failed: {}", err);
        }
    })?;

    println!("Querying demo/store/** with {} consolidation", mode);
    let replies = session.get_with(
        "demo/store/**",
        FifoChannel::new(16),
        GetOptions::default().with_consolidation(mode),
    )?;
    for reply in replies.iter() {
        match reply.result() {
            Ok(sample) => println!(
                "  {} = {}",
                sample.key_expr(),
                sample.payload().to_string_lossy()
            ),
            Err(err) => println!("  error: {}", err),
        }
    }
    session.close()
}
