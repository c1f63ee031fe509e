use crate::cli::args::Cli;
use crate::core::engine::{self, RunConfig};
use crate::report;
use crate::report::plot::PlotFormat;
use anyhow::{Context, Result, bail};
use clap::Parser;
use std::env;
use std::fs;
use std::time::{Duration, Instant};

pub fn entry() -> Result<()> {
    run(Cli::parse())
}

fn run(args: Cli) -> Result<()> {
    let stats = stats_enabled();
    let t0 = Instant::now();

    stage(stats, "preflight", || {
        if !args.input_dir.is_dir() {
            bail!("input directory not found: {}", args.input_dir.display());
        }
        if let Some(plot) = &args.plot_file {
            PlotFormat::from_path(plot)?;
        }
        Ok(())
    })?;

    let t_engine = Instant::now();
    let output = engine::run(RunConfig {
        input_dir: args.input_dir.clone(),
    })?;
    stage_done(stats, "engine", t_engine);
    if stats {
        eprintln!(
            "STAR_SUMMARY_STATS files={} rows={}",
            output.files.len(),
            output.table.len()
        );
    }

    let output_path = args.input_dir.join(&args.output_file);
    let t_xlsx = Instant::now();
    report::xlsx::write(&output_path, &output.table)
        .with_context(|| format!("failed to write {}", output_path.display()))?;
    stage_done(stats, "xlsx", t_xlsx);
    if stats {
        let size = fs::metadata(&output_path).map(|m| m.len()).unwrap_or(0);
        eprintln!(
            "STAR_SUMMARY_STATS output xlsx={} bytes={}",
            output_path.display(),
            size
        );
    }
    println!("Summary saved to: {}", output_path.display());

    let t_plot = Instant::now();
    report::plot::render(&output.table, args.plot_file.as_deref(), args.show_plot)?;
    stage_done(stats, "plot", t_plot);
    if let Some(plot) = &args.plot_file {
        println!("Plot saved to: {}", plot.display());
    }

    if stats {
        eprintln!("STAR_SUMMARY_STATS total={}", fmt_dur(t0.elapsed()));
    }
    Ok(())
}

fn stats_enabled() -> bool {
    matches!(env::var("STAR_SUMMARY_STATS").as_deref(), Ok("1"))
}

fn stage<F>(stats: bool, name: &str, f: F) -> Result<()>
where
    F: FnOnce() -> Result<()>,
{
    let t = Instant::now();
    let res = f();
    if stats {
        eprintln!(
            "STAR_SUMMARY_STATS stage={} time={}",
            name,
            fmt_dur(t.elapsed())
        );
    }
    res
}

fn stage_done(stats: bool, name: &str, t: Instant) {
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
