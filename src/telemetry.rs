//! Tracing initialization for hosts and tests.
//!
//! The core only *emits* `tracing` events (resolution stubs, merge
//! discards, invalidation counts); subscribing to them is the host's
//! choice. These helpers cover the common cases:
//!
//! - [`init`]: human-readable output to stderr, filtered by `WEFT_LOG`
//!   (or `RUST_LOG`), defaulting to `info`.
//! - [`init_json`]: JSON events to stderr, for hosts that ship logs.
//!
//! Both are idempotent: a second call is a no-op, so tests can call them
//! freely.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

fn env_filter() -> EnvFilter {
    std::env::var("WEFT_LOG")
        .ok()
        .and_then(|directives| directives.parse().ok())
        .unwrap_or_else(|| {
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
        })
}

/// Install a human-readable stderr subscriber.
pub fn init() {
    let _ = tracing_subscriber::registry()
        .with(env_filter())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

/// Install a JSON stderr subscriber.
pub fn init_json() {
    let _ = tracing_subscriber::registry()
        .with(env_filter())
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr),
        )
        .try_init();
}
