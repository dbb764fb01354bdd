use tracing_subscriber::EnvFilter;

/// Install a `tracing` fmt subscriber filtered by `RUST_LOG`.
///
/// Falls back to `info` with `ares_data=debug` when `RUST_LOG` is unset or
/// invalid. Calling it twice is harmless: the second install is ignored.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,ares_data=debug"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
