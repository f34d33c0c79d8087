use tracing_subscriber::EnvFilter;

/// Initializes tracing for the bridge process.
///
/// Output goes to stderr: stdout is the stdio transport's data channel and
/// must carry nothing but response frames. Honors `RUST_LOG`, defaulting
/// to info. Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .try_init();
}
