use anyhow::{Context, Result, bail};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Hands the chart to the desktop's default image viewer.
pub fn show_svg(svg: &str) -> Result<()> {
    let path = preview_path();
    fs::write(&path, svg).with_context(|| format!("failed to write {}", path.display()))?;
    open(&path)
}

const PREVIEW_NAME: &str = "star_mapping_summary_preview.svg";

/// One fixed file in the temp dir; each `--show_plot` run overwrites it.
fn preview_path() -> PathBuf {
    env::temp_dir().join(PREVIEW_NAME)
}

fn open(path: &Path) -> Result<()> {
    let (program, args) = opener();
    let status = Command::new(program)
        .args(args)
        .arg(path)
        .status()
        .with_context(|| format!("failed to launch {} to display the plot", program))?;
    if !status.success() {
        bail!("{} exited with {} while opening {}", program, status, path.display());
    }
    Ok(())
}

const NO_ARGS: &[&str] = &[];
// `start` treats its first quoted argument as the window title.
const WINDOWS_START: &[&str] = &["/C", "start", ""];

fn opener() -> (&'static str, &'static [&'static str]) {
    if cfg!(target_os = "macos") {
        ("open", NO_ARGS)
    } else if cfg!(target_os = "windows") {
        ("cmd", WINDOWS_START)
    } else {
        ("xdg-open", NO_ARGS)
    }
}
