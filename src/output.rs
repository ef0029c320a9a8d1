use std::io::{self, Write};
use std::sync::Mutex;

/// Destination for rendered lines, shared by every worker.
pub trait LineSink: Send + Sync {
    /// Write one line. An error means the destination can take no more output.
    fn emit(&self, line: &str) -> io::Result<()>;
}

/// Writes each line to stdout with a single locked write.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutSink;

impl LineSink for StdoutSink {
    fn emit(&self, line: &str) -> io::Result<()> {
        let mut out = io::stdout().lock();
        writeln!(out, "{line}")
    }
}

/// Collects lines in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().map(|g| g.clone()).unwrap_or_default()
    }
}

impl LineSink for MemorySink {
    fn emit(&self, line: &str) -> io::Result<()> {
        let mut guard = self
            .lines
            .lock()
            .map_err(|_| io::Error::other("memory sink poisoned"))?;
        guard.push(line.to_string());
        Ok(())
    }
}
