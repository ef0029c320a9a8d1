use crate::lookup::Lookup;
use crate::output::LineSink;
use crate::render;
use crate::targets;
use crate::types::{Config, LookupStats, StatsSummary};
use std::io;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Drives targets through expansion, lookup and rendering.
///
/// - Streaming mode runs a fixed pool of `concurrency` workers fed by one
///   producer through a bounded queue of the same capacity, so at most
///   `concurrency` targets are buffered and at most `concurrency` lookups are
///   in flight.
/// - A failed lookup or undecodable payload only skips that address.
/// - A failed write to the sink stops the whole run; see [`Pipeline::output_closed`].
/// - Clones share configuration, client, sink, counters and the stop token.
#[derive(Clone)]
pub struct Pipeline {
    config: Arc<Config>,
    lookup: Arc<dyn Lookup>,
    sink: Arc<dyn LineSink>,
    stats: LookupStats,
    stop: CancellationToken,
}

impl Pipeline {
    pub fn new(config: Config, lookup: Arc<dyn Lookup>, sink: Arc<dyn LineSink>) -> Self {
        Self {
            config: Arc::new(config),
            lookup,
            sink,
            stats: LookupStats::new(),
            stop: CancellationToken::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn stats(&self) -> StatsSummary {
        self.stats.summary()
    }

    /// True once a write to the sink has failed and the run was cut short.
    pub fn output_closed(&self) -> bool {
        self.stop.is_cancelled()
    }

    /// Process one target in the calling task.
    pub async fn run_single(&self, target: &str) -> StatsSummary {
        self.process_target(target).await;
        self.finish()
    }

    /// Read newline-delimited targets from `input` until end of input and
    /// return once every worker has drained the queue, or as soon as the
    /// workers stop because the sink failed.
    pub async fn run_stream<R>(&self, input: R) -> StatsSummary
    where
        R: AsyncBufRead + Unpin + Send + 'static,
    {
        let workers_n = self.config.concurrency.get();
        let (tx, rx) = mpsc::channel::<String>(workers_n);
        let rx = Arc::new(Mutex::new(rx));

        let mut workers = JoinSet::new();
        for id in 0..workers_n {
            let rx = rx.clone();
            let pipeline = self.clone();
            workers.spawn(async move {
                loop {
                    // The lock is held only while waiting for the next target.
                    let next = tokio::select! {
                        _ = pipeline.stop.cancelled() => None,
                        next = async { rx.lock().await.recv().await } => next,
                    };
                    let Some(target) = next else { break };
                    pipeline.process_target(&target).await;
                }
                debug!(worker = id, "worker exiting");
            });
        }
        drop(rx);
        debug!(workers = workers_n, "worker pool started");

        let producer = tokio::spawn(produce(input, tx));

        while let Some(res) = workers.join_next().await {
            if let Err(e) = res {
                error!(error = %e, "worker task failed");
            }
        }

        // With the workers gone early the producer may still be parked on a read.
        if self.stop.is_cancelled() {
            producer.abort();
        }
        match producer.await {
            Err(e) if !e.is_cancelled() => error!(error = %e, "input producer task failed"),
            _ => {}
        }

        self.finish()
    }

    /// Expand `target` and look up each resulting address in order.
    pub async fn process_target(&self, target: &str) {
        self.stats.targets.fetch_add(1, Ordering::Relaxed);
        let addresses = targets::expand(target);
        if addresses.is_block() {
            debug!(%target, count = addresses.size_hint().0, "expanding block");
        }
        for ip in addresses {
            if self.stop.is_cancelled() {
                break;
            }
            self.process_item(&ip).await;
        }
    }

    /// Look up a single address and emit its rendered lines.
    pub async fn process_item(&self, ip: &str) {
        self.stats.lookups.fetch_add(1, Ordering::Relaxed);

        let payload = match self.lookup.lookup(ip).await {
            Ok(payload) => payload,
            Err(e) => {
                self.stats.failed.fetch_add(1, Ordering::Relaxed);
                warn!(%ip, timeout = e.is_timeout(), "{e}");
                return;
            }
        };

        match render::try_render(&payload, self.config.mode, ip) {
            Ok(lines) => {
                for line in &lines {
                    if let Err(e) = self.sink.emit(line) {
                        self.close_output(e);
                        return;
                    }
                    self.stats.lines.fetch_add(1, Ordering::Relaxed);
                }
            }
            Err(e) => {
                self.stats.undecodable.fetch_add(1, Ordering::Relaxed);
                debug!(%ip, error = %e, "skipping undecodable payload");
            }
        }
    }

    fn close_output(&self, e: io::Error) {
        if e.kind() == io::ErrorKind::BrokenPipe {
            debug!("output closed, stopping");
        } else {
            error!(error = %e, "failed to write output, stopping");
        }
        self.stop.cancel();
    }

    fn finish(&self) -> StatsSummary {
        let summary = self.stats.summary();
        info!(
            targets = summary.targets,
            lookups = summary.lookups,
            failed = summary.failed,
            undecodable = summary.undecodable,
            lines = summary.lines,
            "done"
        );
        summary
    }
}

/// Feed trimmed, non-empty lines into the queue. Dropping `tx` on return
/// closes the queue, which is what stops the workers.
async fn produce<R>(mut input: R, tx: mpsc::Sender<String>)
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match input.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                let target = line.trim();
                if target.is_empty() {
                    continue;
                }
                if tx.send(target.to_string()).await.is_err() {
                    warn!("all workers gone, stopping input");
                    break;
                }
            }
            Err(e) => {
                error!(error = %e, "failed to read input, treating as end of input");
                break;
            }
        }
    }
}

/// Pick the single-shot target: the lexicographically last of all raw
/// arguments (flags included).
pub fn single_shot_target<I>(args: I) -> Option<String>
where
    I: IntoIterator<Item = String>,
{
    let mut args: Vec<String> = args.into_iter().collect();
    args.sort();
    args.pop()
}
