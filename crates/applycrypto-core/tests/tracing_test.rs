//! Tests for the tracing setup.

use std::sync::Mutex;

use applycrypto_core::tracing::setup::{default_directive, init_tracing};

static TRACING_MUTEX: Mutex<()> = Mutex::new(());

#[test]
fn test_init_with_debug_filter() {
    let _lock = TRACING_MUTEX.lock().unwrap();
    std::env::set_var("APPLYCRYPTO_LOG", "debug");
    init_tracing();
    std::env::remove_var("APPLYCRYPTO_LOG");
}

#[test]
fn test_init_with_per_module_filter() {
    let _lock = TRACING_MUTEX.lock().unwrap();
    std::env::set_var(
        "APPLYCRYPTO_LOG",
        "applycrypto_analysis::call_graph=debug,applycrypto_analysis::flow=trace",
    );
    init_tracing();
    std::env::remove_var("APPLYCRYPTO_LOG");
}

#[test]
fn test_init_tracing_idempotent() {
    let _lock = TRACING_MUTEX.lock().unwrap();
    init_tracing();
    init_tracing();
    init_tracing();
    tracing::info!(target: "applycrypto", "still alive after repeated init");
}

#[test]
fn test_default_directive_is_a_valid_filter() {
    let filter = tracing_subscriber::EnvFilter::try_new(default_directive());
    assert!(filter.is_ok());
}
