//! Tests for session publish/subscribe and declaration lifecycles

#[cfg(test)]
mod tests {
    use std::{
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc, Mutex,
        },
        thread,
        time::Duration,
    };

    use keyrelay::{
        channels::TryRecvError, Config, EntityState, ErrorKind, FifoChannel, PublisherOptions,
        PutOptions, RingChannel, Sample, SampleKind, Session, Encoding,
    };

    fn open() -> Session {
        Session::open_local(Config::default()).unwrap()
    }

    #[test]
    fn test_end_to_end_fifo_subscriber() {
        let session = open();
        let subscriber = session
            .declare_subscriber("a/b/**", FifoChannel::new(10))
            .unwrap();

        session.put("a/b/c", "hello").unwrap();
        session.put("a/x", "ignored").unwrap();

        let sample = subscriber.try_recv().unwrap();
        assert_eq!(sample.key_expr().as_str(), "a/b/c");
        assert_eq!(sample.payload().to_vec(), b"hello".to_vec());
        assert_eq!(sample.kind(), SampleKind::Put);
        assert_eq!(subscriber.try_recv().unwrap_err(), TryRecvError::Empty);
    }

    #[test]
    fn test_fifo_subscriber_backpressure() {
        let session = open();
        let subscriber = session.declare_subscriber("load/**", FifoChannel::new(2)).unwrap();
        let publisher = session.declare_publisher("load/value").unwrap();

        let completed = Arc::new(AtomicUsize::new(0));
        let completed_pub = completed.clone();
        let writer = thread::spawn(move || {
            for i in 1..=3u32 {
                publisher.put(i.to_string()).unwrap();
                completed_pub.fetch_add(1, Ordering::SeqCst);
            }
        });

        thread::sleep(Duration::from_millis(100));
        assert_eq!(completed.load(Ordering::SeqCst), 2);

        let first = subscriber.recv().unwrap();
        writer.join().unwrap();
        assert_eq!(completed.load(Ordering::SeqCst), 3);

        let mut values = vec![first.payload().to_string_lossy()];
        values.extend(subscriber.try_iter().map(|s| s.payload().to_string_lossy()));
        assert_eq!(values, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_ring_subscriber_keeps_newest() {
        let session = open();
        let subscriber = session.declare_subscriber("pose", RingChannel::new(3)).unwrap();
        for i in 1..=10u32 {
            session.put("pose", i.to_string()).unwrap();
        }
        let values: Vec<_> = subscriber
            .try_iter()
            .map(|s| s.payload().to_string_lossy())
            .collect();
        assert_eq!(values, vec!["8", "9", "10"]);
        assert_eq!(subscriber.stats().evicted, 7);
    }

    #[test]
    fn test_publisher_options_and_delete() {
        let session = open();
        let subscriber = session.declare_subscriber("doc/*", FifoChannel::new(4)).unwrap();
        let publisher = session
            .declare_publisher_with(
                "doc/1",
                PublisherOptions::default().with_encoding(Encoding::APPLICATION_JSON),
            )
            .unwrap();

        publisher
            .put_with("{}", PutOptions::default().with_attachment("rev=2"))
            .unwrap();
        publisher.delete().unwrap();

        let put = subscriber.recv().unwrap();
        assert_eq!(put.encoding(), &Encoding::APPLICATION_JSON);
        assert_eq!(put.attachment().map(|a| a.to_vec()), Some(b"rev=2".to_vec()));

        let delete = subscriber.recv().unwrap();
        assert_eq!(delete.kind(), SampleKind::Delete);
        assert!(delete.payload().is_empty());
        assert!(put.timestamp() < delete.timestamp());
    }

    #[test]
    fn test_undeclare_is_idempotent() {
        let session = open();
        let publisher = session.declare_publisher("a").unwrap();
        let subscriber = session.declare_subscriber("a", FifoChannel::new(4)).unwrap();
        assert_eq!(publisher.state(), EntityState::Active);

        subscriber.undeclare().unwrap();
        subscriber.undeclare().unwrap();
        assert_eq!(subscriber.state(), EntityState::Undeclared);
        assert!(subscriber.is_disconnected());

        publisher.undeclare().unwrap();
        publisher.undeclare().unwrap();
        let err = publisher.put("late").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NullOrDisposed);
        assert_eq!(session.stats().active_declarations(), 0);
    }

    #[test]
    fn test_dropped_subscriber_stops_receiving() {
        let session = open();
        let hits = Arc::new(AtomicUsize::new(0));
        let hits_cb = hits.clone();
        let subscriber = session
            .declare_subscriber("a/**", move |_sample: Sample| {
                hits_cb.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        session.put("a/1", "x").unwrap();
        drop(subscriber);
        session.put("a/2", "x").unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_callback_panic_does_not_poison_delivery() {
        let session = open();
        let _faulty = session
            .declare_subscriber("a", |_sample: Sample| panic!("subscriber failure"))
            .unwrap();
        let healthy = session.declare_subscriber("a", FifoChannel::new(4)).unwrap();

        session.put("a", "1").unwrap();
        session.put("a", "2").unwrap();
        assert_eq!(healthy.try_iter().count(), 2);
    }

    #[test]
    fn test_operations_after_close() {
        let session = open();
        let publisher = session.declare_publisher("a").unwrap();
        let subscriber = session.declare_subscriber("a", FifoChannel::new(4)).unwrap();

        session.close().unwrap();
        session.close().unwrap();
        assert!(session.is_closed());

        assert_eq!(session.put("a", "x").unwrap_err().kind(), ErrorKind::SessionClosed);
        assert_eq!(publisher.put("x").unwrap_err().kind(), ErrorKind::SessionClosed);
        assert!(session.declare_subscriber("b", FifoChannel::new(1)).is_err());
        assert!(subscriber.recv().is_err());

        publisher.undeclare().unwrap();
        subscriber.undeclare().unwrap();
    }

    #[test]
    fn test_last_session_clone_closes() {
        let session = open();
        let subscriber = session.declare_subscriber("a", FifoChannel::new(4)).unwrap();
        let clone = session.clone();
        drop(session);
        clone.put("a", "x").unwrap();
        drop(clone);

        assert!(subscriber.recv().is_ok());
        assert!(subscriber.recv().is_err());
    }

    #[test]
    fn test_concurrent_publishers() {
        let session = open();
        let seen = Arc::new(Mutex::new(0usize));
        let seen_cb = seen.clone();
        let _subscriber = session
            .declare_subscriber("fan/**", move |_sample: Sample| {
                *seen_cb.lock().unwrap() += 1;
            })
            .unwrap();

        let writers: Vec<_> = (0..4)
            .map(|w| {
                let session = session.clone();
                thread::spawn(move || {
                    for i in 0..250 {
                        session.put(format!("fan/{}/{}", w, i), "x").unwrap();
                    }
                })
            })
            .collect();
        for writer in writers {
            writer.join().unwrap();
        }
        assert_eq!(*seen.lock().unwrap(), 1000);
    }
}
