//! Tests for process-wide logger initialisation

#[cfg(test)]
mod tests {
    use keyrelay::{init_log_from_env, try_init_log_from_env, Config, FifoChannel, Session};

    // Single test in this binary so the process-wide state starts fresh
    #[test]
    fn test_logger_installs_once_per_process() {
        assert!(try_init_log_from_env());
        assert!(!try_init_log_from_env());
        init_log_from_env();
        init_log_from_env();
        assert!(!try_init_log_from_env());

        log::warn!("logging after repeated initialisation");
        let session = Session::open_local(Config::default()).unwrap();
        let subscriber = session.declare_subscriber("log/**", FifoChannel::new(1)).unwrap();
        session.put("log/a", "x").unwrap();
        assert_eq!(subscriber.try_iter().count(), 1);
    }
}
