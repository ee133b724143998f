//! Tracing subscriber setup for the binary

use anyhow::Result;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    EnvFilter, Registry,
};

//-----------------------------------------------------------------------------
// Tracing Initialization
//-----------------------------------------------------------------------------

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over `log_level`, which defaults to `"info"`
/// and accepts module directives such as `"defi_evm_loan=debug,warn"`.
/// Logs go to stderr so that `--json` results on stdout stay parseable.
pub fn init_tracing(log_level: Option<&str>, json_output: bool) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level.unwrap_or("info")))?;

    let subscriber = Registry::default().with(env_filter);

    if json_output {
        let json_layer = fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_span_events(FmtSpan::CLOSE)
            .with_current_span(true)
            .with_span_list(true);
        tracing::subscriber::set_global_default(subscriber.with(json_layer))?;
    } else {
        let fmt_layer = fmt::layer()
            .pretty()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_level(true);
        tracing::subscriber::set_global_default(subscriber.with(fmt_layer))?;
    }

    Ok(())
}

//-----------------------------------------------------------------------------
// Tests
//-----------------------------------------------------------------------------
