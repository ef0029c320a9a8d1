use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Public endpoint of the host intelligence database queried per address.
pub const DEFAULT_ENDPOINT: &str = "https://internetdb.shodan.io";

/// Default number of parallel workers (and the work queue capacity).
pub const DEFAULT_CONCURRENCY: usize = 20;

/// Default per-request timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// How each successful lookup is rendered on stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Raw response body, one line per lookup.
    Json,
    /// `IP:PORT,hostnames,tags,cpes,vulns` per open port.
    Csv,
    /// Bare `IP:PORT` per open port.
    HostOnly,
    /// Lookups still run and are decoded, nothing is printed.
    Silent,
}

impl OutputMode {
    /// Resolve the output flags. `json` takes precedence over `csv`, and
    /// `open` only narrows csv output.
    pub fn resolve(json: bool, csv: bool, open: bool) -> Self {
        match (json, csv, open) {
            (true, _, _) => OutputMode::Json,
            (false, true, true) => OutputMode::HostOnly,
            (false, true, false) => OutputMode::Csv,
            (false, false, _) => OutputMode::Silent,
        }
    }
}

/// Settings for the HTTP lookup client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupSettings {
    pub endpoint: String,
    pub timeout: Duration,
    /// Reject self-signed or otherwise invalid certificates when set.
    pub verify_tls: bool,
}

impl Default for LookupSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            verify_tls: false,
        }
    }
}

/// Process-wide configuration, built once at startup and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub concurrency: NonZeroUsize,
    pub mode: OutputMode,
    pub lookup: LookupSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            concurrency: NonZeroUsize::new(DEFAULT_CONCURRENCY).unwrap_or(NonZeroUsize::MIN),
            mode: OutputMode::Csv,
            lookup: LookupSettings::default(),
        }
    }
}

/// Decoded host intelligence for one address. Every field may be absent.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct HostRecord {
    #[serde(default)]
    pub ip: String,
    /// Open ports in the order the service returned them.
    #[serde(default)]
    pub ports: Vec<u16>,
    #[serde(default)]
    pub hostnames: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub cpes: Vec<String>,
    #[serde(default)]
    pub vulns: Vec<String>,
}

/// Run counters shared by all workers.
#[derive(Clone, Debug, Default)]
pub struct LookupStats {
    pub targets: Arc<AtomicU64>,
    pub lookups: Arc<AtomicU64>,
    pub failed: Arc<AtomicU64>,
    pub undecodable: Arc<AtomicU64>,
    pub lines: Arc<AtomicU64>,
}

impl LookupStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn summary(&self) -> StatsSummary {
        StatsSummary {
            targets: self.targets.load(Ordering::Relaxed),
            lookups: self.lookups.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            undecodable: self.undecodable.load(Ordering::Relaxed),
            lines: self.lines.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`LookupStats`].
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSummary {
    pub targets: u64,
    pub lookups: u64,
    pub failed: u64,
    pub undecodable: u64,
    pub lines: u64,
}
