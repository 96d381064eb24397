//! field-translator: bulk translation of record fields through a paid
//! chat-completions provider.
//! Content-addressed caching keeps repeat texts off the wire, each call sends
//! at most one batch, and an availability breaker stops calls while the
//! provider is rate-limited or failing.

pub mod config;
pub mod error;
pub mod language;
pub mod translate;

pub use config::EngineConfig;
pub use error::{Error, Result};
pub use language::{Direction, Language};
pub use translate::{BatchResult, TranslationEngine, TranslationRequest};

/// Install the global tracing subscriber. `RUST_LOG` overrides the default
/// filter; `json` switches to machine-readable output.
pub fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("field_translator=info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}
