use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const DEFAULT_FILTER: &str = "info";

/// Install the global subscriber, logging to stdout.
///
/// An explicit `directive` wins over `RUST_LOG`; with neither, everything at
/// `info` and above is shown.
pub fn init(directive: Option<&str>) -> Result<()> {
    let filter = filter(directive)?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stdout).with_filter(filter))
        .try_init()
        .or_raise(|| ErrorKind::Logging)
}

fn filter(directive: Option<&str>) -> Result<EnvFilter> {
    match directive {
        Some(directive) => EnvFilter::try_new(directive).or_raise(|| ErrorKind::Logging),
        None => Ok(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))),
    }
}
