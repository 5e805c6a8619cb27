use clap::Parser;
use std::path::PathBuf;

/// Public proxy for the releases of a private GitHub repository.
///
/// Settings come from the environment (`GITHUB_TOKEN`, `REPO_OWNER`,
/// `REPO_NAME`, `PORT`, `BIND_ADDRESS`, `GITHUB_API_URL`), optionally layered
/// over a TOML file.
#[derive(Debug, Parser)]
#[command(name = "vitrine", version, about)]
pub struct Cli {
    /// Additional TOML configuration file. Must exist if given.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log filter directive (e.g. `debug` or `vitrine_gateway=trace`).
    /// Overrides `RUST_LOG`.
    #[arg(long, value_name = "FILTER")]
    pub log_level: Option<String>,
}
