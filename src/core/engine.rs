use crate::core::model::{Category, LOG_SUFFIX, LogRecord, SummaryRow, SummaryTable};
use crate::core::star_log;
use anyhow::{Context, Result, anyhow, bail};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

pub struct RunConfig {
    pub input_dir: PathBuf,
}

pub struct RunOutput {
    pub table: SummaryTable,
    pub files: Vec<LogFile>,
}

#[derive(Clone, Debug)]
pub struct LogFile {
    pub sample: String,
    pub path: PathBuf,
}

pub fn run(cfg: RunConfig) -> Result<RunOutput> {
    let stats = stats_enabled();

    let t_discover = Instant::now();
    let files = discover_logs(&cfg.input_dir)?;
    log_stage(stats, "engine.discover", t_discover);

    let t_parse = Instant::now();
    let mut records = Vec::with_capacity(files.len());
    for f in &files {
        let record = star_log::parse_file(&f.path)?;
        if stats {
            eprintln!(
                "STAR_SUMMARY_STATS file={} sample={} fields={}",
                f.path.display(),
                f.sample,
                record.len()
            );
            if record.is_empty() {
                eprintln!("STAR_SUMMARY_STATS no recognized fields in {}", f.path.display());
            }
        }
        records.push((f.sample.clone(), record));
    }
    log_stage(stats, "engine.parse", t_parse);

    let t_norm = Instant::now();
    let table = normalize(records)?;
    log_stage(stats, "engine.normalize", t_norm);
    if stats && table.is_empty() {
        eprintln!(
            "STAR_SUMMARY_STATS no *{} files in {}",
            LOG_SUFFIX,
            cfg.input_dir.display()
        );
    }

    Ok(RunOutput { table, files })
}

/// Entries of `dir` named `<sample>_Log.final.out`, in listing order.
pub fn discover_logs(dir: &Path) -> Result<Vec<LogFile>> {
    let mut out = Vec::new();
    let entries =
        fs::read_dir(dir).with_context(|| format!("failed to read directory {}", dir.display()))?;
    for entry in entries {
        let entry = entry.with_context(|| format!("failed to list {}", dir.display()))?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if let Some(sample) = name.strip_suffix(LOG_SUFFIX) {
            out.push(LogFile {
                sample: sample.to_string(),
                path: entry.path(),
            });
        }
    }
    Ok(out)
}

pub fn normalize(records: Vec<(String, LogRecord)>) -> Result<SummaryTable> {
    let mut rows = Vec::with_capacity(records.len());
    for (sample, record) in records {
        let pct = |category: Category| -> Result<f64> {
            let column = category.label();
            let raw = record
                .get(category.field())
                .ok_or_else(|| anyhow!("sample {}: missing column {}", sample, column))?;
            parse_percent(raw)
                .with_context(|| format!("sample {}: invalid value in column {}", sample, column))
        };
        let unique_pct = pct(Category::Unique)?;
        let multi_pct = pct(Category::Multi)?;
        let unmapped_short_pct = pct(Category::UnmappedShort)?;
        rows.push(SummaryRow {
            total_reads: record.total_reads.clone(),
            sample,
            unique_pct,
            multi_pct,
            unmapped_short_pct,
        });
    }
    Ok(SummaryTable { rows })
}

/// `"92.50%"` -> `92.5`. Every trailing `%` is dropped; NaN and infinities
/// are rejected.
pub fn parse_percent(raw: &str) -> Result<f64> {
    let v = raw.trim_end_matches('%');
    let value = v
        .trim()
        .parse::<f64>()
        .with_context(|| format!("not a number: {:?}", raw))?;
    if !value.is_finite() {
        bail!("not a number: {:?}", raw);
    }
    Ok(value)
}

fn stats_enabled() -> bool {
    matches!(std::env::var("STAR_SUMMARY_STATS").as_deref(), Ok("1"))
}

fn log_stage(stats: bool, name: &str, t: Instant) {
    if stats {
        eprintln!(
            "STAR_SUMMARY_STATS stage={} time={}",
            name,
            fmt_dur(t.elapsed())
        );
    }
}

fn fmt_dur(d: Duration) -> String {
    if d.as_secs_f64() < 1.0 {
        format!("{}ms", d.as_millis())
    } else {
        format!("{:.3}s", d.as_secs_f64())
    }
}
