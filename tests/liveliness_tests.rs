//! Tests for liveliness tokens, subscribers and gets

#[cfg(test)]
mod tests {
    use std::{
        sync::{Arc, Barrier},
        thread,
    };

    use keyrelay::{Config, ErrorKind, FifoChannel, KeyExpr, SampleKind, Session};

    fn open() -> Session {
        Session::open_local(Config::default()).unwrap()
    }

    fn events(subscriber: &keyrelay::channels::Consumer<keyrelay::Sample>) -> Vec<(SampleKind, String)> {
        subscriber
            .try_iter()
            .map(|s| (s.kind(), s.key_expr().to_string()))
            .collect()
    }

    #[test]
    fn test_token_appears_and_disappears() {
        let session = open();
        let watcher = session
            .liveliness()
            .declare_subscriber("group/**", FifoChannel::new(8))
            .unwrap();

        let token = session.liveliness().declare_token("group/a").unwrap();
        token.undeclare().unwrap();
        token.undeclare().unwrap();

        assert_eq!(
            events(&watcher),
            vec![
                (SampleKind::Put, "group/a".to_string()),
                (SampleKind::Delete, "group/a".to_string()),
            ]
        );
    }

    #[test]
    fn test_duplicate_tokens_stay_alive_until_last() {
        let session = open();
        let watcher = session
            .liveliness()
            .declare_subscriber("group/*", FifoChannel::new(8))
            .unwrap();

        let first = session.liveliness().declare_token("group/a").unwrap();
        let second = session.liveliness().declare_token("group/a").unwrap();
        drop(first);
        assert_eq!(events(&watcher), vec![(SampleKind::Put, "group/a".to_string())]);
        drop(second);
        assert_eq!(events(&watcher), vec![(SampleKind::Delete, "group/a".to_string())]);
    }

    #[test]
    fn test_concurrent_duplicate_tokens_announce_once() {
        const THREADS: usize = 8;
        for _ in 0..20 {
            let session = open();
            let watcher = session
                .liveliness()
                .declare_subscriber("group/*", FifoChannel::new(64))
                .unwrap();

            let barrier = Arc::new(Barrier::new(THREADS));
            let declarers: Vec<_> = (0..THREADS)
                .map(|_| {
                    let session = session.clone();
                    let barrier = barrier.clone();
                    thread::spawn(move || {
                        barrier.wait();
                        session.liveliness().declare_token("group/a").unwrap()
                    })
                })
                .collect();
            let tokens: Vec<_> = declarers.into_iter().map(|t| t.join().unwrap()).collect();
            assert_eq!(events(&watcher), vec![(SampleKind::Put, "group/a".to_string())]);

            let barrier = Arc::new(Barrier::new(THREADS));
            let undeclarers: Vec<_> = tokens
                .into_iter()
                .map(|token| {
                    let barrier = barrier.clone();
                    thread::spawn(move || {
                        barrier.wait();
                        token.undeclare().unwrap();
                    })
                })
                .collect();
            for undeclarer in undeclarers {
                undeclarer.join().unwrap();
            }
            assert_eq!(events(&watcher), vec![(SampleKind::Delete, "group/a".to_string())]);
        }
    }

    #[test]
    fn test_history_replays_alive_tokens() {
        let session = open();
        let _a = session.liveliness().declare_token("group/a").unwrap();
        let _b = session.liveliness().declare_token("group/b").unwrap();
        let _c = session.liveliness().declare_token("other/c").unwrap();

        let late = session
            .liveliness()
            .declare_subscriber_with_history("group/**", FifoChannel::new(8), true)
            .unwrap();
        assert_eq!(
            events(&late),
            vec![
                (SampleKind::Put, "group/a".to_string()),
                (SampleKind::Put, "group/b".to_string()),
            ]
        );

        let without = session
            .liveliness()
            .declare_subscriber("group/**", FifoChannel::new(8))
            .unwrap();
        assert!(events(&without).is_empty());
    }

    #[test]
    fn test_liveliness_get_lists_local_and_remote_tokens() {
        let session = open();
        let _local = session.liveliness().declare_token("peers/local").unwrap();
        let remote = KeyExpr::new("peers/remote").unwrap();
        session.handle_liveliness(&remote, true).unwrap();

        let replies = session.liveliness().get("peers/*", FifoChannel::new(8)).unwrap();
        let keys: Vec<_> = replies
            .iter()
            .map(|r| r.into_result().unwrap().key_expr().to_string())
            .collect();
        assert_eq!(keys, vec!["peers/local", "peers/remote"]);

        session.handle_liveliness(&remote, false).unwrap();
        let replies = session.liveliness().get("peers/*", FifoChannel::new(8)).unwrap();
        assert_eq!(replies.iter().count(), 1);
    }

    #[test]
    fn test_remote_tokens_notify_subscribers() {
        let session = open();
        let watcher = session
            .liveliness()
            .declare_subscriber("peers/**", FifoChannel::new(8))
            .unwrap();
        let remote = KeyExpr::new("peers/r1").unwrap();

        session.handle_liveliness(&remote, true).unwrap();
        session.handle_liveliness(&remote, true).unwrap();
        session.handle_liveliness(&remote, false).unwrap();
        session.handle_liveliness(&remote, false).unwrap();

        assert_eq!(
            events(&watcher),
            vec![
                (SampleKind::Put, "peers/r1".to_string()),
                (SampleKind::Delete, "peers/r1".to_string()),
            ]
        );
    }

    #[test]
    fn test_liveliness_after_close() {
        let session = open();
        let token = session.liveliness().declare_token("a").unwrap();
        session.close().unwrap();

        let err = session.liveliness().declare_token("b").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SessionClosed);
        assert!(session.liveliness().get("**", FifoChannel::new(1)).is_err());
        token.undeclare().unwrap();
    }
}
