use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

/// Route library logs to the test harness. Set `RUST_LOG=debug` to see them.
#[allow(dead_code)]
pub fn init_test_tracing() -> tracing::subscriber::DefaultGuard {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_span_events(FmtSpan::NONE)
        .with_test_writer()
        .finish();
    tracing::subscriber::set_default(subscriber)
}
