//! Publish/subscribe over a local session with every kind of handler

use keyrelay::{
    Config, Encoding, FifoChannel, PublisherOptions, PutOptions, Result, RingChannel,
    Sample, Session,
};
use std::{thread, time::Duration};

fn main() -> Result<()> {
    keyrelay::init_log_from_env();

    println!("Keyrelay Pub/Sub Example");
    println!("========================");

    let session = Session::open_local(Config::default())?;
    println!("Session {} opened", session.zid());

    // Callback subscriber: runs on the publishing thread
    let _logger = session.declare_subscriber("robot/**", |sample: Sample| {
        println!(
            "  [callback] {:?} {} = {}",
            sample.kind(),
            sample.key_expr(),
            sample.payload().to_string_lossy()
        );
    })?;

    // Ring subscriber: keeps only the newest poses
    let poses = session.declare_subscriber("robot/*/pose", RingChannel::new(2))?;

    // Fifo subscriber drained by another thread
    let events = session.declare_subscriber("robot/*/event", FifoChannel::new(4))?;
    let reader = thread::spawn(move || {
        let mut seen = Vec::new();
        while let Ok(sample) = events.recv_timeout(Duration::from_millis(200)) {
            seen.push(sample.payload().to_string_lossy());
        }
        seen
    });

    let publisher = session.declare_publisher_with(
        "robot/arm/pose",
        PublisherOptions::default().with_encoding(Encoding::TEXT_PLAIN),
    )?;
    for step in 0..5 {
        publisher.put(format!("x={}", step))?;
    }
    session.put_with(
        "robot/arm/event",
        "gripper closed",
        PutOptions::default().with_attachment("seq=1"),
    )?;
    session.delete("robot/arm/event")?;

    println!("\nNewest poses kept by the ring:");
    for sample in poses.try_iter() {
        println!("  {}", sample.payload().to_string_lossy());
    }

    let seen = reader.join().unwrap_or_default();
    println!("\nEvents seen by the reader thread: {:?}", seen);

    let stats = session.stats();
    println!("\nPublications: {}", stats.total_publications());
    println!("Deliveries: {}", stats.total_deliveries());

    session.close()?;
    println!("\nSession closed");
    Ok(())
}
