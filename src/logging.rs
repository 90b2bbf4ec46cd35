//! Logger setup for hosts and demos.

use env_logger::{Builder, Env};
use log::LevelFilter;

/// Install the global logger. `RUST_LOG` wins when set; otherwise the
/// default is `debug` for `verbose` runs and `info` otherwise.
pub fn init(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let env = Env::default().default_filter_or(level.to_string());

    // A second init (tests, embedding hosts) keeps the first logger.
    let _ = Builder::from_env(env).format_timestamp_millis().try_init();
}
