//! Tests for get, queryables, queriers and consolidation

#[cfg(test)]
mod tests {
    use std::{
        sync::{Arc, Mutex},
        thread,
        time::{Duration, Instant},
    };

    use keyrelay::{
        Config, ConsolidationMode, ErrorKind, FifoChannel, GetOptions, KeyExpr, Query,
        QuerierOptions, QueryTarget, QueryableOptions, Reply, Sample, Session, Timestamp,
    };

    fn open() -> Session {
        Session::open_local(Config::default()).unwrap()
    }

    fn payloads(replies: impl Iterator<Item = Reply>) -> Vec<String> {
        replies
            .filter_map(|reply| reply.into_result().ok())
            .map(|sample| sample.payload().to_string_lossy())
            .collect()
    }

    fn stamped(key: &str, payload: &str, ts: Timestamp) -> Sample {
        Sample::put(KeyExpr::new(key).unwrap(), payload.to_string()).with_timestamp(ts)
    }

    #[test]
    fn test_get_without_queryables_closes_immediately() {
        let session = open();
        let start = Instant::now();
        let replies = session.get("nobody/**", FifoChannel::new(4)).unwrap();
        assert!(replies.recv().is_err());
        assert!(start.elapsed() < Duration::from_secs(1));
        assert_eq!(session.pending_gets(), 0);
    }

    #[test]
    fn test_get_collects_from_matching_queryables() {
        let session = open();
        let _a = session
            .declare_queryable("store/a", |query: Query| {
                query.reply("store/a", "A").unwrap();
            })
            .unwrap();
        let _b = session
            .declare_queryable("store/b", |query: Query| {
                query.reply("store/b", "B").unwrap();
            })
            .unwrap();
        let _other = session
            .declare_queryable("other/**", |query: Query| {
                query.reply("other/x", "X").unwrap();
            })
            .unwrap();

        let replies = session.get("store/*", FifoChannel::new(8)).unwrap();
        let mut values = payloads(replies.iter());
        values.sort();
        assert_eq!(values, vec!["A", "B"]);
    }

    #[test]
    fn test_query_exposes_selector_and_payload() {
        let session = open();
        let seen = Arc::new(Mutex::new(None));
        let seen_cb = seen.clone();
        let _q = session
            .declare_queryable("calc/**", move |query: Query| {
                *seen_cb.lock().unwrap() = Some((
                    query.key_expr().to_string(),
                    query.parameters().get("op").map(str::to_string),
                    query.payload().map(|p| p.to_string_lossy()),
                ));
                query.reply_err("unsupported").unwrap();
            })
            .unwrap();

        let replies = session
            .get_with(
                "calc/add?op=sum;precise",
                FifoChannel::new(4),
                GetOptions::default().with_payload("1 2"),
            )
            .unwrap();
        let reply = replies.recv().unwrap();
        let err = reply.result().unwrap_err();
        assert_eq!(err.payload().to_string_lossy(), "unsupported");
        assert!(replies.recv().is_err());

        let seen = seen.lock().unwrap().clone().unwrap();
        assert_eq!(seen.0, "calc/add");
        assert_eq!(seen.1.as_deref(), Some("sum"));
        assert_eq!(seen.2.as_deref(), Some("1 2"));
    }

    #[test]
    fn test_reply_outside_query_key_is_rejected() {
        let session = open();
        let _q = session
            .declare_queryable("a/**", |query: Query| {
                let err = query.reply("b/c", "nope").unwrap_err();
                assert_eq!(err.kind(), ErrorKind::InvalidArgument);
                query.reply("a/c", "yes").unwrap();
            })
            .unwrap();
        let replies = session.get("a/*", FifoChannel::new(4)).unwrap();
        assert_eq!(payloads(replies.iter()), vec!["yes"]);
    }

    #[test]
    fn test_latest_consolidation_through_session() {
        let session = open();
        let t1 = session.new_timestamp();
        let t2 = session.new_timestamp();
        let t3 = session.new_timestamp();
        let order = [(t2, "second"), (t3, "third"), (t1, "first")];

        let _q = session
            .declare_queryable("temp", move |query: Query| {
                for (ts, payload) in order.iter() {
                    let sample = stamped("temp", payload, *ts);
                    query.reply_sample(sample).unwrap();
                }
            })
            .unwrap();

        let replies = session
            .get_with(
                "temp",
                FifoChannel::new(4),
                GetOptions::default().with_consolidation(ConsolidationMode::Latest),
            )
            .unwrap();
        let replies: Vec<_> = replies.iter().collect();
        assert_eq!(replies.len(), 1);
        let sample = replies[0].result().unwrap();
        assert_eq!(sample.payload().to_string_lossy(), "third");
        assert_eq!(sample.timestamp(), Some(&t3));
    }

    #[test]
    fn test_monotonic_and_none_consolidation() {
        let session = open();
        let t1 = session.new_timestamp();
        let t2 = session.new_timestamp();
        let samples = vec![
            stamped("k", "new", t2),
            stamped("k", "old", t1),
            stamped("k", "new-again", t2),
        ];
        let _q = session
            .declare_queryable("k", move |query: Query| {
                for sample in samples.iter() {
                    query.reply_sample(sample.clone()).unwrap();
                }
            })
            .unwrap();

        let monotonic = session
            .get_with(
                "k",
                FifoChannel::new(8),
                GetOptions::default().with_consolidation(ConsolidationMode::Monotonic),
            )
            .unwrap();
        assert_eq!(payloads(monotonic.iter()), vec!["new"]);

        let none = session
            .get_with(
                "k",
                FifoChannel::new(8),
                GetOptions::default().with_consolidation(ConsolidationMode::None),
            )
            .unwrap();
        assert_eq!(payloads(none.iter()), vec!["new", "old", "new-again"]);
    }

    #[test]
    fn test_get_times_out() {
        let session = open();
        let queries = session.declare_queryable("slow", FifoChannel::new(4)).unwrap();

        let start = Instant::now();
        let replies = session
            .get_with(
                "slow",
                FifoChannel::new(4),
                GetOptions::default().with_timeout(Duration::from_millis(100)),
            )
            .unwrap();
        assert!(replies.recv().is_err());
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(90));
        assert!(elapsed < Duration::from_secs(5));
        assert_eq!(session.pending_gets(), 0);

        // The late answer goes nowhere
        let query = queries.try_recv().unwrap();
        query.reply("slow", "late").unwrap();
    }

    #[test]
    fn test_threaded_queryable() {
        let session = open();
        let queries = session.declare_queryable("work/**", FifoChannel::new(4)).unwrap();
        let worker = thread::spawn(move || {
            let query = queries.recv().unwrap();
            thread::sleep(Duration::from_millis(20));
            query.reply("work/1", "done").unwrap();
        });

        let replies = session.get("work/**", FifoChannel::new(4)).unwrap();
        assert_eq!(payloads(replies.iter()), vec!["done"]);
        worker.join().unwrap();
    }

    #[test]
    fn test_query_targets() {
        let session = open();
        let _partial = session
            .declare_queryable("db/*", |query: Query| {
                query.reply("db/x", "partial").unwrap();
            })
            .unwrap();
        let _complete = session
            .declare_queryable_with(
                "db/**",
                |query: Query| {
                    query.reply("db/x", "complete").unwrap();
                },
                QueryableOptions::default().with_complete(true),
            )
            .unwrap();

        let get = |target| {
            let replies = session
                .get_with(
                    "db/x",
                    FifoChannel::new(8),
                    GetOptions::default()
                        .with_target(target)
                        .with_consolidation(ConsolidationMode::None),
                )
                .unwrap();
            let mut values = payloads(replies.iter());
            values.sort();
            values
        };
        assert_eq!(get(QueryTarget::BestMatching), vec!["complete"]);
        assert_eq!(get(QueryTarget::AllComplete), vec!["complete"]);
        assert_eq!(get(QueryTarget::All), vec!["complete", "partial"]);
    }

    #[test]
    fn test_querier_reuses_its_options() {
        let session = open();
        let _q = session
            .declare_queryable("svc/**", |query: Query| {
                let name = query.parameters().get("name").unwrap_or("world").to_string();
                query.reply("svc/hello", format!("hello {}", name)).unwrap();
            })
            .unwrap();
        let querier = session
            .declare_querier_with(
                "svc/hello",
                QuerierOptions::default()
                    .with_target(QueryTarget::All)
                    .with_timeout(Duration::from_secs(1)),
            )
            .unwrap();

        let replies = querier.get(FifoChannel::new(4)).unwrap();
        assert_eq!(payloads(replies.iter()), vec!["hello world"]);
        let replies = querier.get_with("name=relay", None, FifoChannel::new(4)).unwrap();
        assert_eq!(payloads(replies.iter()), vec!["hello relay"]);

        querier.undeclare().unwrap();
        assert_eq!(
            querier.get(FifoChannel::new(4)).unwrap_err().kind(),
            ErrorKind::NullOrDisposed
        );
    }

    #[test]
    fn test_close_ends_pending_gets() {
        let session = open();
        let queries = session.declare_queryable("hold", FifoChannel::new(4)).unwrap();
        let replies = session.get("hold", FifoChannel::new(4)).unwrap();
        assert_eq!(session.pending_gets(), 1);

        session.close().unwrap();
        assert!(replies.recv().is_err());
        drop(queries);
    }
}
