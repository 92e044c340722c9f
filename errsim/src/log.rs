/**
 * file: log.rs
 * desc: Application logging.
 */
use tracing::Level;

/**
 * Sets up tracing and logging. All logging goes to stderr.
 */
pub fn setup_logging(verbose: bool) {
    tracing_subscriber::fmt()
        .with_ansi(true)
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_max_level(if verbose { Level::DEBUG } else { Level::INFO })
        .init();
}
