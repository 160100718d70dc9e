pub(crate) mod fixtures;

mod scenario;

/// Routes engine logs to the test harness. `RUST_LOG=grid_staging=debug`
/// shows per-operation dispatch.
pub(crate) fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
