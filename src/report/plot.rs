use crate::core::model::SummaryTable;
use crate::report::{chart, viewer};
use anyhow::{Context, Result, bail};
use std::fs;
use std::path::Path;
use svg2pdf::usvg;
use svg2pdf::{ConversionOptions, PageOptions};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PlotFormat {
    Svg,
    Pdf,
    Png,
}

impl PlotFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("svg") => Ok(PlotFormat::Svg),
            Some("pdf") => Ok(PlotFormat::Pdf),
            Some("png") => Ok(PlotFormat::Png),
            _ => bail!(
                "unsupported plot format for {} (use a .png, .svg or .pdf file name)",
                path.display()
            ),
        }
    }
}

/// Renders the chart once and sends it to the requested sinks. The rendered
/// chart is dropped before returning whichever sinks were used.
pub fn render(table: &SummaryTable, save_path: Option<&Path>, show: bool) -> Result<()> {
    if save_path.is_none() && !show {
        return Ok(());
    }
    let svg = chart::render_svg(table)?;
    if let Some(path) = save_path {
        save(&svg, path)?;
    }
    if show {
        viewer::show_svg(&svg)?;
    }
    drop(svg);
    Ok(())
}

pub fn save(svg: &str, path: &Path) -> Result<()> {
    match PlotFormat::from_path(path)? {
        PlotFormat::Svg => {
            fs::write(path, svg).with_context(|| format!("failed to write {}", path.display()))?;
        }
        PlotFormat::Pdf => {
            let pdf = svg_to_pdf(svg).with_context(|| "failed to convert chart to PDF")?;
            fs::write(path, pdf).with_context(|| format!("failed to write {}", path.display()))?;
        }
        PlotFormat::Png => {
            let png = svg_to_png(svg).with_context(|| "failed to rasterize chart to PNG")?;
            fs::write(path, png).with_context(|| format!("failed to write {}", path.display()))?;
        }
    }
    Ok(())
}

fn svg_to_pdf(svg: &str) -> Result<Vec<u8>> {
    let mut opt = usvg::Options::default();
    opt.fontdb_mut().load_system_fonts();
    let tree =
        usvg::Tree::from_str(svg, &opt).map_err(|e| anyhow::anyhow!("usvg parse failed: {e}"))?;
    let pdf = svg2pdf::to_pdf(&tree, ConversionOptions::default(), PageOptions::default())
        .map_err(|e| anyhow::anyhow!("svg2pdf conversion failed: {e}"))?;
    Ok(pdf)
}

fn svg_to_png(svg: &str) -> Result<Vec<u8>> {
    use resvg::{tiny_skia, usvg};

    let mut opt = usvg::Options::default();
    opt.fontdb_mut().load_system_fonts();
    let tree =
        usvg::Tree::from_str(svg, &opt).map_err(|e| anyhow::anyhow!("usvg parse failed: {e}"))?;
    let size = tree.size().to_int_size();
    let mut pixmap = tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| anyhow::anyhow!("invalid chart size {}x{}", size.width(), size.height()))?;
    resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());
    let png = pixmap
        .encode_png()
        .map_err(|e| anyhow::anyhow!("PNG encoding failed: {e}"))?;
    Ok(png)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::SummaryRow;

    fn table() -> SummaryTable {
        SummaryTable {
            rows: vec![SummaryRow {
                sample: "SampleA".to_string(),
                total_reads: Some("1000000".to_string()),
                unique_pct: 90.12,
                multi_pct: 5.0,
                unmapped_short_pct: 2.5,
            }],
        }
    }

    #[test]
    fn format_follows_extension() {
        assert_eq!(
            PlotFormat::from_path(Path::new("out/plot.SVG")).unwrap(),
            PlotFormat::Svg
        );
        assert_eq!(
            PlotFormat::from_path(Path::new("plot.pdf")).unwrap(),
            PlotFormat::Pdf
        );
        assert_eq!(
            PlotFormat::from_path(Path::new("C:/plots/plot.png")).unwrap(),
            PlotFormat::Png
        );
        assert!(PlotFormat::from_path(Path::new("plot.gif")).is_err());
        assert!(PlotFormat::from_path(Path::new("plot")).is_err());
    }

    #[test]
    fn saves_svg() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chart.svg");
        render(&table(), Some(&path), false).unwrap();
        let body = fs::read_to_string(&path).unwrap();
        assert!(body.starts_with("<svg"));
        assert!(body.contains(chart::TITLE));
    }

    #[test]
    fn saves_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chart.pdf");
        render(&table(), Some(&path), false).unwrap();
        let body = fs::read(&path).unwrap();
        assert!(body.starts_with(b"%PDF"));
    }

    #[test]
    fn saves_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chart.png");
        render(&table(), Some(&path), false).unwrap();
        let body = fs::read(&path).unwrap();
        assert!(body.starts_with(b"\x89PNG\r\n\x1a\n"));
    }

    #[test]
    fn no_sink_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        render(&table(), None, false).unwrap();
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
