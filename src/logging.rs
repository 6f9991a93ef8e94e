use env_logger::Env;
use tracing_subscriber::EnvFilter;

/// Install the process-wide logger.
///
/// Default is a tracing fmt subscriber filtered by `RUST_LOG` (falls back to
/// `info`), with `log::` records bridged in. `NAME_RESOLVER_PLAIN_LOG=1`
/// selects env_logger instead.
pub fn init_logging() {
    let plain = std::env::var("NAME_RESOLVER_PLAIN_LOG")
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);
    if plain {
        let _ = env_logger::Builder::from_env(Env::default().default_filter_or("info")).try_init();
    } else {
        init_tracing_from_env();
    }
}

pub fn init_tracing_from_env() {
    // Bridge log:: macros into tracing so library code keeps using the log facade
    let _ = tracing_log::LogTracer::init();
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}
