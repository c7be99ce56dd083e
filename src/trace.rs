/// Install the global tracing subscriber.
///
/// Filtering follows `RUST_LOG` when set and defaults to `info`. `log`
/// records emitted by dependencies are bridged into tracing. Safe to call
/// more than once; later calls are no-ops.
pub fn init() {
    let _ = tracing_log::LogTracer::init();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .try_init();
}
