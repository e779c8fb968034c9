//! Logger setup for binaries, demos and tests
//!
//! The library itself only emits through the `log` facade.

use std::sync::Once;

use env_logger::Env;

/// Environment variable holding the filter, `RUST_LOG` syntax
pub const LOG_ENV: &str = "KEYRELAY_LOG";

static INIT: Once = Once::new();

/// Install an `env_logger` reading [`LOG_ENV`], defaulting to `warn`.
///
/// Only the first call in the process attempts the install. Returns `true`
/// if this call installed the logger, `false` if an earlier call ran or
/// another logger was already in place.
pub fn try_init_log_from_env() -> bool {
    let mut installed = false;
    INIT.call_once(|| {
        installed = env_logger::Builder::from_env(Env::default().filter_or(LOG_ENV, "warn"))
            .format_timestamp_millis()
            .try_init()
            .is_ok();
    });
    installed
}

/// Like [`try_init_log_from_env`], ignoring the outcome
pub fn init_log_from_env() {
    if !try_init_log_from_env() {
        log::debug!("logger already initialised");
    }
}
