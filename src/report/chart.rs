use crate::core::model::{Category, SummaryTable};
use anyhow::Result;
use std::fmt::Write;

pub const TITLE: &str = "STAR Mapping Summary per Sample";
pub const LEGEND_TITLE: &str = "Category";
pub const X_LABEL: &str = "Sample";
pub const Y_LABEL: &str = "Percentage (%)";

const WIDTH: f64 = 1200.0;
const HEIGHT: f64 = 600.0;
const COLORS: [&str; 3] = ["#1f77b4", "#ff7f0e", "#2ca02c"];

/// Grouped bar chart: one group per sample, one bar per category.
pub fn render_svg(table: &SummaryTable) -> Result<String> {
    let mut out = String::new();
    let (w, h) = (WIDTH, HEIGHT);
    writeln!(
        out,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{}\" height=\"{}\" viewBox=\"0 0 {} {}\" font-family=\"sans-serif\">",
        w, h, w, h
    )?;
    writeln!(
        out,
        "<rect x=\"0\" y=\"0\" width=\"{}\" height=\"{}\" fill=\"#fff\"/>",
        w, h
    )?;

    let left = 70.0;
    let right = 230.0;
    let top = 48.0;
    let bottom = 140.0;
    let plot_w = w - left - right;
    let plot_h = h - top - bottom;

    writeln!(
        out,
        "<text x=\"{}\" y=\"{}\" font-size=\"18\" fill=\"#222\" text-anchor=\"middle\">{}</text>",
        left + plot_w / 2.0,
        top - 18.0,
        TITLE
    )?;
    writeln!(
        out,
        "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"#fff\" stroke=\"#ddd\"/>",
        left, top, plot_w, plot_h
    )?;

    let long = table.melt();
    let max_v = long.iter().map(|r| r.percentage).fold(0.0, f64::max);
    let (_, step, count) = nice_ticks(0.0, if max_v > 0.0 { max_v } else { 100.0 }, 6);
    let y_max = step * (count - 1) as f64;
    draw_y_axis_ticks(&mut out, left, top, plot_w, plot_h, y_max, step, count)?;

    let groups = table.len();
    let group_w = if groups == 0 {
        plot_w
    } else {
        plot_w / groups as f64
    };
    let bar_w = group_w * 0.8 / Category::ALL.len() as f64;

    let per_group = Category::ALL.len();
    for (i, bar) in long.iter().enumerate() {
        let (g, c) = (i / per_group, i % per_group);
        let bh = if y_max > 0.0 {
            bar.percentage / y_max * plot_h
        } else {
            0.0
        };
        writeln!(
            out,
            "<rect class=\"bar\" x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" fill=\"{}\"><title>{}: {} = {}</title></rect>",
            left + g as f64 * group_w + group_w * 0.1 + c as f64 * bar_w,
            top + plot_h - bh,
            bar_w,
            bh,
            COLORS[c],
            escape_svg(bar.sample),
            bar.category.label(),
            fmt_tick(bar.percentage)
        )?;
    }
    for (g, row) in table.rows.iter().enumerate() {
        // Rotated 45 degrees and anchored at the end so the text ends under the group.
        let tx = left + g as f64 * group_w + group_w / 2.0;
        let ty = top + plot_h + 14.0;
        writeln!(
            out,
            "<text x=\"{:.2}\" y=\"{:.2}\" font-size=\"11\" fill=\"#444\" text-anchor=\"end\" transform=\"rotate(-45 {:.2} {:.2})\">{}</text>",
            tx,
            ty,
            tx,
            ty,
            escape_svg(&row.sample)
        )?;
    }

    draw_axis_labels(&mut out, left, top, plot_w, plot_h, h)?;
    draw_legend(&mut out, left + plot_w + 20.0, top)?;
    writeln!(out, "</svg>")?;
    Ok(out)
}

fn draw_y_axis_ticks(
    out: &mut String,
    left: f64,
    top: f64,
    plot_w: f64,
    plot_h: f64,
    max_y: f64,
    step: f64,
    count: usize,
) -> Result<()> {
    for i in 0..count {
        let v = step * i as f64;
        let y = top + plot_h - (v / max_y.max(1e-6)) * plot_h;
        writeln!(
            out,
            "<line x1=\"{}\" y1=\"{:.2}\" x2=\"{}\" y2=\"{:.2}\" stroke=\"#eee\"/>",
            left,
            y,
            left + plot_w,
            y
        )?;
        writeln!(
            out,
            "<text x=\"{}\" y=\"{:.2}\" font-size=\"10\" fill=\"#666\" text-anchor=\"end\" dominant-baseline=\"middle\">{}</text>",
            left - 4.0,
            y,
            fmt_tick(v)
        )?;
    }
    Ok(())
}

fn draw_axis_labels(
    out: &mut String,
    left: f64,
    top: f64,
    plot_w: f64,
    plot_h: f64,
    h: f64,
) -> Result<()> {
    writeln!(
        out,
        "<text x=\"{}\" y=\"{}\" font-size=\"12\" fill=\"#444\" text-anchor=\"middle\">{}</text>",
        left + plot_w / 2.0,
        h - 12.0,
        X_LABEL
    )?;
    let yx = left - 44.0;
    let yy = top + plot_h / 2.0;
    writeln!(
        out,
        "<text x=\"{}\" y=\"{}\" font-size=\"12\" fill=\"#444\" text-anchor=\"middle\" transform=\"rotate(-90 {} {})\">{}</text>",
        yx, yy, yx, yy, Y_LABEL
    )?;
    Ok(())
}

fn draw_legend(out: &mut String, x: f64, y: f64) -> Result<()> {
    let entry_h = 20.0;
    let box_h = 30.0 + entry_h * Category::ALL.len() as f64;
    writeln!(
        out,
        "<rect x=\"{}\" y=\"{}\" width=\"200\" height=\"{}\" fill=\"#fff\" stroke=\"#ccc\"/>",
        x, y, box_h
    )?;
    writeln!(
        out,
        "<text x=\"{}\" y=\"{}\" font-size=\"12\" font-weight=\"bold\" fill=\"#222\">{}</text>",
        x + 10.0,
        y + 18.0,
        LEGEND_TITLE
    )?;
    for (i, category) in Category::ALL.iter().enumerate() {
        let ey = y + 28.0 + i as f64 * entry_h;
        writeln!(
            out,
            "<rect x=\"{}\" y=\"{}\" width=\"14\" height=\"12\" fill=\"{}\"/>",
            x + 10.0,
            ey,
            COLORS[i]
        )?;
        writeln!(
            out,
            "<text x=\"{}\" y=\"{}\" font-size=\"11\" fill=\"#333\" dominant-baseline=\"middle\">{}</text>",
            x + 30.0,
            ey + 6.0,
            category.label()
        )?;
    }
    Ok(())
}

fn nice_ticks(min: f64, max: f64, ticks: usize) -> (f64, f64, usize) {
    let range = (max - min).abs().max(1e-9);
    let rough = range / (ticks as f64 - 1.0);
    let mag = 10f64.powf(rough.abs().log10().floor());
    let norm = rough / mag;
    let step = if norm <= 1.0 {
        1.0
    } else if norm <= 2.0 {
        2.0
    } else if norm <= 5.0 {
        5.0
    } else {
        10.0
    } * mag;
    let start = (min / step).floor() * step;
    let end = (max / step).ceil() * step;
    let count = ((end - start) / step).round() as usize + 1;
    (start, step, count)
}

fn fmt_tick(v: f64) -> String {
    if (v - v.round()).abs() < 0.001 {
        format!("{}", v.round() as i64)
    } else if v.abs() < 10.0 {
        format!("{:.2}", v)
    } else {
        format!("{:.1}", v)
    }
}

fn escape_svg(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
