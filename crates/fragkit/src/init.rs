//! Process-wide setup.

/// Initializes logging from `RUST_LOG`.
///
/// Safe to call more than once; only the first call installs the logger.
pub fn init() {
    if env_logger::try_init().is_ok() {
        log::info!("fragkit initialized");
    }
}
