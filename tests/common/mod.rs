//! Shared setup for integration tests

use std::sync::Once;

static RUSTLS_INIT: Once = Once::new();

/// Install the ring crypto provider for rustls
///
/// Must run before the first HTTP client is built. Safe to call from every
/// test.
pub fn init_rustls() {
    RUSTLS_INIT.call_once(|| {
        rustls::crypto::ring::default_provider()
            .install_default()
            .expect("Failed to install rustls crypto provider");
    });
}
