//! Tests for delivery channels

use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    thread,
    time::{Duration, Instant},
};

use super::*;
use crate::error::ErrorKind;

#[test]
fn test_ring_drops_oldest() {
    let (producer, consumer) = bounded(3, OverflowPolicy::DropOldest);
    for i in 1..=10 {
        assert!(producer.push(i));
    }
    let drained: Vec<_> = consumer.try_iter().collect();
    assert_eq!(drained, vec![8, 9, 10]);

    let stats = consumer.stats();
    assert_eq!(stats.pushed, 10);
    assert_eq!(stats.evicted, 7);
    assert_eq!(stats.received, 3);
}

#[test]
fn test_zero_capacity_is_clamped() {
    let (producer, consumer) = bounded(0, OverflowPolicy::DropOldest);
    assert_eq!(consumer.capacity(), 1);
    producer.push(1);
    producer.push(2);
    assert_eq!(consumer.try_recv(), Ok(2));
    assert_eq!(FifoChannel::new(0).capacity(), 1);
}

#[test]
fn test_disconnect_drains_then_reports() {
    let (producer, consumer) = bounded(8, OverflowPolicy::Block);
    for i in 1..=3 {
        producer.push(i);
    }
    drop(producer);

    assert!(consumer.is_disconnected());
    assert_eq!(consumer.recv(), Ok(1));
    assert_eq!(consumer.recv(), Ok(2));
    assert_eq!(consumer.recv(), Ok(3));
    let err = consumer.recv().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ChannelDisconnected);
    assert_eq!(consumer.try_recv(), Err(TryRecvError::Disconnected));
}

#[test]
fn test_try_recv_on_open_empty_channel() {
    let (_producer, consumer) = bounded::<u32>(4, OverflowPolicy::Block);
    let start = Instant::now();
    let err = consumer.try_recv().unwrap_err();
    assert_eq!(err, TryRecvError::Empty);
    assert_eq!(err.kind(), ErrorKind::ChannelNoData);
    assert!(start.elapsed() < Duration::from_secs(1));
}

#[test]
fn test_push_after_close_is_rejected() {
    let (producer, consumer) = bounded(4, OverflowPolicy::Block);
    producer.close();
    producer.close();
    assert!(!producer.push(1));
    assert!(producer.is_closed());
    assert_eq!(consumer.stats().rejected, 1);
    assert!(consumer.is_empty());
}

#[test]
fn test_recv_timeout() {
    let (producer, consumer) = bounded::<u32>(4, OverflowPolicy::Block);
    let err = consumer.recv_timeout(Duration::from_millis(20)).unwrap_err();
    assert_eq!(err, RecvTimeoutError::Timeout);

    producer.push(7);
    assert_eq!(consumer.recv_timeout(Duration::from_millis(20)), Ok(7));

    drop(producer);
    assert_eq!(
        consumer.recv_timeout(Duration::from_secs(5)),
        Err(RecvTimeoutError::Disconnected)
    );
}

#[test]
fn test_blocked_recv_wakes_on_push() {
    let (producer, consumer) = bounded(1, OverflowPolicy::Block);
    let handle = thread::spawn(move || consumer.recv());
    thread::sleep(Duration::from_millis(20));
    producer.push(42);
    assert_eq!(handle.join().unwrap(), Ok(42));
}

#[test]
fn test_blocked_recv_wakes_on_close() {
    let (producer, consumer) = bounded::<u8>(1, OverflowPolicy::Block);
    let handle = thread::spawn(move || consumer.recv());
    thread::sleep(Duration::from_millis(20));
    producer.close();
    assert_eq!(handle.join().unwrap(), Err(RecvError));
}

#[test]
fn test_dropping_consumer_releases_blocked_push() {
    let (producer, consumer) = bounded(1, OverflowPolicy::Block);
    producer.push(1);
    let handle = thread::spawn(move || producer.push(2));
    thread::sleep(Duration::from_millis(20));
    drop(consumer);
    assert!(!handle.join().unwrap());
}

#[test]
fn test_iter_ends_on_disconnect() {
    let (producer, consumer) = bounded(16, OverflowPolicy::Block);
    let handle = thread::spawn(move || {
        for i in 0..100 {
            producer.push(i);
        }
    });
    let received: Vec<_> = consumer.iter().collect();
    handle.join().unwrap();
    assert_eq!(received, (0..100).collect::<Vec<_>>());
    assert!(consumer.stats().blocked_pushes <= 100);
}

#[test]
fn test_callback_handler_catches_panics() {
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = calls.clone();
    let (callback, ()) = IntoHandler::<u32>::into_handler(move |value: u32| {
        seen.fetch_add(1, Ordering::SeqCst);
        if value == 2 {
            panic!("boom");
        }
    });

    callback.call(1);
    callback.call(2);
    callback.call(3);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[test]
fn test_fifo_handler_close_disconnects() {
    let (callback, consumer) = IntoHandler::<u32>::into_handler(FifoChannel::new(4));
    callback.call(1);
    callback.call(2);
    callback.close();
    callback.call(3);

    assert_eq!(consumer.recv(), Ok(1));
    assert_eq!(consumer.recv(), Ok(2));
    assert_eq!(consumer.recv(), Err(RecvError));
}

#[test]
fn test_ring_handler_drops_oldest() {
    let (callback, consumer) = IntoHandler::<u32>::into_handler(RingChannel::new(2));
    for i in 0..5 {
        callback.call(i);
    }
    drop(callback);
    assert_eq!(consumer.iter().collect::<Vec<_>>(), vec![3, 4]);
}
