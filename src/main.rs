use std::io::IsTerminal;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use cinfo::logging;
use cinfo::lookup::HttpLookup;
use cinfo::output::StdoutSink;
use cinfo::pipeline::{self, Pipeline};
use cinfo::types::{Config, LookupSettings, OutputMode, DEFAULT_ENDPOINT, DEFAULT_TIMEOUT_MS};

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use tokio::io::BufReader;

/// cinfo: enrich IPs and CIDR ranges with open ports, hostnames, tags and vulns.
///
/// Reads targets from stdin, one per line, or takes one from the command line
/// when stdin is a terminal:
///
///     cat ips.txt | cinfo -c 100
#[derive(Debug, Clone, Parser)]
#[command(name = "cinfo", version, about, long_about = None)]
struct Cli {
    /// Number of parallel lookups (also the input queue size).
    #[arg(short = 'c', long, default_value = "20")]
    concurrency: NonZeroUsize,

    /// Print the raw JSON response per lookup (overrides --csv).
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Print one CSV line per open port. Use `--csv=false` to disable.
    #[arg(
        long,
        action = ArgAction::Set,
        num_args = 0..=1,
        require_equals = true,
        default_value_t = true,
        default_missing_value = "true"
    )]
    csv: bool,

    /// Only print `IP:PORT` in CSV mode.
    #[arg(long, default_value_t = false)]
    open: bool,

    /// Base URL of the host intelligence service.
    #[arg(long, default_value = DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Per-request timeout in milliseconds.
    #[arg(long = "timeout-ms", default_value_t = DEFAULT_TIMEOUT_MS)]
    timeout_ms: u64,

    /// Reject invalid or self-signed TLS certificates.
    #[arg(long = "verify-tls", default_value_t = false)]
    verify_tls: bool,

    /// More diagnostics on stderr (-v info, -vv debug).
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Target IP or CIDR when stdin is a terminal.
    targets: Vec<String>,
}

impl Cli {
    fn config(&self) -> Config {
        Config {
            concurrency: self.concurrency,
            mode: OutputMode::resolve(self.json, self.csv, self.open),
            lookup: LookupSettings {
                endpoint: self.endpoint.clone(),
                timeout: Duration::from_millis(self.timeout_ms),
                verify_tls: self.verify_tls,
            },
        }
    }
}

/// Accept the single-dash long flags of the original tool (`-json`,
/// `-csv=false`, `-open`) by rewriting them to their `--` forms.
fn normalize_args<I>(args: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    args.into_iter()
        .map(|arg| match arg.as_str() {
            "-json" | "-csv" | "-open" => format!("-{arg}"),
            _ if arg.starts_with("-csv=") => format!("-{arg}"),
            _ => arg,
        })
        .collect()
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_from(normalize_args(std::env::args()));
    logging::init(cli.verbose);

    let config = cli.config();
    tracing::debug!(?config, "configuration");

    let client = HttpLookup::new(&config.lookup).context("failed to set up lookup client")?;
    let pipeline = Pipeline::new(config, Arc::new(client), Arc::new(StdoutSink));

    if std::io::stdin().is_terminal() {
        let target = pipeline::single_shot_target(std::env::args().skip(1))
            .context("no target given; pass an IP or CIDR, or pipe targets on stdin")?;
        pipeline.run_single(&target).await;
    } else {
        pipeline.run_stream(BufReader::new(tokio::io::stdin())).await;
        if pipeline.output_closed() {
            // A blocking stdin read cannot be cancelled and would hold the runtime open.
            std::process::exit(0);
        }
    }

    Ok(())
}
