use crate::types::{HostRecord, OutputMode};

/// Render a raw lookup payload into output lines for `ip`.
///
/// Decode failures produce no lines.
pub fn render(payload: &[u8], mode: OutputMode, ip: &str) -> Vec<String> {
    try_render(payload, mode, ip).unwrap_or_default()
}

/// Like [`render`] but reports a payload that does not decode as a host record.
///
/// Json mode never decodes: the payload is passed through as a single line.
/// An empty body means "no data" in every mode and renders nothing.
pub fn try_render(payload: &[u8], mode: OutputMode, ip: &str) -> serde_json::Result<Vec<String>> {
    if payload.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }

    if mode == OutputMode::Json {
        return Ok(vec![raw_line(payload)]);
    }

    let record: HostRecord = serde_json::from_slice(payload)?;
    Ok(match mode {
        OutputMode::Csv => csv_lines(&record, ip, false),
        OutputMode::HostOnly => csv_lines(&record, ip, true),
        OutputMode::Json | OutputMode::Silent => Vec::new(),
    })
}

/// One line per open port: `IP:PORT` followed, unless `host_only`, by the
/// hostnames, tags, cpes and vulns groups. Values within a group are joined
/// with `;`, groups with `,`; empty groups keep their column.
pub fn csv_lines(record: &HostRecord, ip: &str, host_only: bool) -> Vec<String> {
    let extra = if host_only {
        String::new()
    } else {
        format!(
            ",{},{},{},{}",
            record.hostnames.join(";"),
            record.tags.join(";"),
            record.cpes.join(";"),
            record.vulns.join(";"),
        )
    };

    record
        .ports
        .iter()
        .map(|port| format!("{ip}:{port}{extra}"))
        .collect()
}

fn raw_line(payload: &[u8]) -> String {
    let text = String::from_utf8_lossy(payload);
    text.trim_end_matches(['\r', '\n']).to_string()
}
