//! Report output.

use crate::error::Result;
use crate::simulation::AggregateRow;
use serde::Serialize;
use std::fmt::Write as _;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

/// Write `value` as pretty JSON, creating parent directories as needed.
pub fn write_json(path: impl AsRef<Path>, value: &impl Serialize) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    tracing::info!(path = %path.display(), "report written");
    Ok(())
}

/// Fixed-width text table of aggregate rows.
pub fn render_table(rows: &[AggregateRow]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<20} {:>5} {:>5} {:>6} {:>6} {:>13} {:>9} {:>9} {:>9} {:>10} {:>10} {:>9}",
        "algorithm", "alpha", "B", "T", "W", "ops/s", "p50 ns", "p95 ns", "p99 ns", "load sd",
        "load max", "max share"
    );
    for row in rows {
        let opt = |v: Option<u64>| v.map_or_else(|| "-".to_owned(), |v| v.to_string());
        let _ = writeln!(
            out,
            "{:<20} {:>5.2} {:>5} {:>6} {:>6} {:>13.0} {:>9.1} {:>9.1} {:>9.1} {:>10.1} {:>10.0} {:>9.3}",
            row.algorithm,
            row.alpha,
            row.pipeline_size,
            opt(row.threshold),
            opt(row.window),
            row.throughput_ops_s.mean,
            row.p50_ns.mean,
            row.p95_ns.mean,
            row.p99_ns.mean,
            row.load_stddev.mean,
            row.load_max.mean,
            row.max_node_share.mean,
        );
    }
    out
}
