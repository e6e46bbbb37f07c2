//! charts of the run results, one svg per view

use std::path::{Path, PathBuf};

use eyre::{ensure, Context, Result};
use plotters::prelude::*;
use tracing::info;

use crate::result::RunResult;

const SIZE: (u32, u32) = (900, 600);
const PALETTE: [RGBColor; 8] = [
    RGBColor(0xd6, 0x27, 0x28),
    RGBColor(0x2c, 0xa0, 0x2c),
    RGBColor(0x1f, 0x77, 0xb4),
    RGBColor(0xff, 0x7f, 0x0e),
    RGBColor(0x94, 0x67, 0xbd),
    RGBColor(0x8c, 0x56, 0x4b),
    RGBColor(0xe3, 0x77, 0xc2),
    RGBColor(0x17, 0xbe, 0xcf),
];
const DRAM_COLOR: RGBColor = RGBColor(0x80, 0x80, 0x80);

/// the built-in methods keep the first palette entries
const KNOWN_METHODS: [&str; 5] = [
    "Default FP16",
    "Quant INT8",
    "Quant INT4",
    "KD 50% + INT4",
    "Prune 50% FP16",
];

/// colour of a method, the same for a name whatever else is plotted
pub fn method_color(name: &str) -> RGBColor {
    let index = KNOWN_METHODS
        .iter()
        .position(|known| *known == name)
        .unwrap_or_else(|| {
            // fnv-1a, stable across builds
            let hash = name.bytes().fold(0xcbf2_9ce4_8422_2325u64, |hash, byte| {
                (hash ^ byte as u64).wrapping_mul(0x0100_0000_01b3)
            });
            (hash % PALETTE.len() as u64) as usize
        });
    PALETTE[index]
}

fn font(size: u32) -> FontDesc<'static> {
    ("sans-serif", size).into_font()
}

fn bar_x_range(count: usize) -> std::ops::Range<f64> {
    -0.5..(count as f64 - 0.5)
}

fn bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    })
}

/// a padded, non-empty range around `[lo, hi]`
fn padded(lo: f64, hi: f64) -> std::ops::Range<f64> {
    let pad = if hi > lo { (hi - lo) * 0.15 } else { hi.abs().max(1.0) * 0.5 };
    (lo - pad)..(hi + pad)
}

/// a log range covering `[lo, hi]` with half a decade of slack
fn log_padded(lo: f64, hi: f64) -> std::ops::Range<f64> {
    (lo / 3.0)..(hi * 3.0)
}

pub fn score_bar(results: &[RunResult], path: &Path) -> Result<()> {
    let root = SVGBackend::new(path, SIZE).into_drawing_area();
    root.fill(&WHITE)?;
    let max_score = bounds(results.iter().map(|r| r.score)).1;
    let names: Vec<&str> = results.iter().map(|r| r.method.as_str()).collect();
    let label = |x: &f64| {
        let index = x.round();
        if (x - index).abs() < 1e-6 && index >= 0.0 {
            names.get(index as usize).map(|s| s.to_string()).unwrap_or_default()
        } else {
            String::new()
        }
    };

    let mut chart = ChartBuilder::on(&root)
        .caption("Score by Method", font(28))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .build_cartesian_2d(bar_x_range(results.len()), 0f64..max_score * 1.2)?;
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(results.len())
        .x_label_formatter(&label)
        .y_desc("Score (Accuracy / Energy x 1e7)")
        .draw()?;

    chart.draw_series(results.iter().enumerate().map(|(i, r)| {
        let x = i as f64;
        Rectangle::new([(x - 0.4, 0.0), (x + 0.4, r.score)], method_color(&r.method).filled())
    }))?;
    chart.draw_series(results.iter().enumerate().map(|(i, r)| {
        Text::new(format!("{:.4}", r.score), (i as f64 - 0.2, r.score * 1.05), font(14))
    }))?;
    root.present()?;
    Ok(())
}

pub fn energy_vs_accuracy(results: &[RunResult], path: &Path) -> Result<()> {
    let root = SVGBackend::new(path, SIZE).into_drawing_area();
    root.fill(&WHITE)?;
    let (e_lo, e_hi) = bounds(results.iter().map(|r| r.energy));
    let (a_lo, a_hi) = bounds(results.iter().map(|r| r.accuracy));

    let mut chart = ChartBuilder::on(&root)
        .caption("Energy vs Accuracy Tradeoff", font(28))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(padded(e_lo, e_hi), padded(a_lo, a_hi))?;
    chart
        .configure_mesh()
        .x_desc("Total Energy")
        .y_desc("Accuracy")
        .draw()?;
    chart.draw_series(results.iter().map(|r| {
        EmptyElement::at((r.energy, r.accuracy))
            + Circle::new((0, 0), 8, method_color(&r.method).filled())
            + Text::new(r.method.clone(), (10, -10), font(14))
    }))?;
    root.present()?;
    Ok(())
}

/// arithmetic intensity against throughput, both on log axes.
/// methods without any MACs have no place on a log axis and are skipped.
pub fn roofline(results: &[RunResult], path: &Path) -> Result<()> {
    let points: Vec<&RunResult> = results
        .iter()
        .filter(|r| r.macs > 0 && r.bytes > 0 && r.cycles > 0)
        .collect();
    ensure!(!points.is_empty(), "no result with MACs to place on a roofline");

    let root = SVGBackend::new(path, SIZE).into_drawing_area();
    root.fill(&WHITE)?;
    let (ai_lo, ai_hi) = bounds(points.iter().map(|r| r.arithmetic_intensity()));
    let (tp_lo, tp_hi) = bounds(points.iter().map(|r| r.throughput));

    let mut chart = ChartBuilder::on(&root)
        .caption("Roofline-Style Performance", font(28))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(80)
        .build_cartesian_2d(
            log_padded(ai_lo, ai_hi).log_scale(),
            log_padded(tp_lo, tp_hi).log_scale(),
        )?;
    chart
        .configure_mesh()
        .x_desc("Arithmetic Intensity (MACs / Byte)")
        .y_desc("Throughput (MACs/sec)")
        .y_label_formatter(&|y: &f64| format!("{y:.1e}"))
        .draw()?;
    chart.draw_series(points.iter().map(|r| {
        EmptyElement::at((r.arithmetic_intensity(), r.throughput))
            + Circle::new((0, 0), 8, method_color(&r.method).filled())
            + Text::new(r.method.clone(), (10, -10), font(14))
    }))?;
    root.present()?;
    Ok(())
}

pub fn energy_breakdown(results: &[RunResult], path: &Path) -> Result<()> {
    let root = SVGBackend::new(path, SIZE).into_drawing_area();
    root.fill(&WHITE)?;
    let max_energy = bounds(results.iter().map(|r| r.energy)).1;
    let names: Vec<&str> = results.iter().map(|r| r.method.as_str()).collect();
    let label = |x: &f64| {
        let index = x.round();
        if (x - index).abs() < 1e-6 && index >= 0.0 {
            names.get(index as usize).map(|s| s.to_string()).unwrap_or_default()
        } else {
            String::new()
        }
    };

    let mut chart = ChartBuilder::on(&root)
        .caption("Energy Breakdown by Method", font(28))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(80)
        .build_cartesian_2d(bar_x_range(results.len()), 0f64..max_energy * 1.15)?;
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(results.len())
        .x_label_formatter(&label)
        .y_label_formatter(&|y: &f64| format!("{y:.1e}"))
        .y_desc("Energy")
        .draw()?;

    chart
        .draw_series(results.iter().enumerate().map(|(i, r)| {
            let x = i as f64;
            Rectangle::new(
                [(x - 0.4, 0.0), (x + 0.4, r.mac_energy)],
                method_color(&r.method).filled(),
            )
        }))?
        .label("Compute (MAC) Energy")
        .legend(|(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], PALETTE[0].filled()));
    chart
        .draw_series(results.iter().enumerate().map(|(i, r)| {
            let x = i as f64;
            Rectangle::new(
                [(x - 0.4, r.mac_energy), (x + 0.4, r.mac_energy + r.dram_energy)],
                DRAM_COLOR.filled(),
            )
        }))?
        .label("DRAM Energy")
        .legend(|(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], DRAM_COLOR.filled()));
    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;
    root.present()?;
    Ok(())
}

pub fn utilization(results: &[RunResult], path: &Path) -> Result<()> {
    let root = SVGBackend::new(path, SIZE).into_drawing_area();
    root.fill(&WHITE)?;
    let (x_lo, x_hi) = bounds(results.iter().map(|r| r.macs_per_cycle()));
    let (y_lo, y_hi) = bounds(results.iter().map(|r| r.bytes_per_cycle()));

    let mut chart = ChartBuilder::on(&root)
        .caption("Hardware Utilization", font(28))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(padded(x_lo, x_hi), padded(y_lo, y_hi))?;
    chart
        .configure_mesh()
        .x_desc("MACs per Cycle")
        .y_desc("Bytes per Cycle")
        .draw()?;
    chart.draw_series(results.iter().map(|r| {
        EmptyElement::at((r.macs_per_cycle(), r.bytes_per_cycle()))
            + Circle::new((0, 0), 8, method_color(&r.method).filled())
            + Text::new(r.method.clone(), (10, -10), font(14))
    }))?;
    root.present()?;
    Ok(())
}

/// draw every chart into `dir`, returning the written files
pub fn plot_all(results: &[RunResult], dir: &Path) -> Result<Vec<PathBuf>> {
    ensure!(!results.is_empty(), "nothing to plot");
    std::fs::create_dir_all(dir).wrap_err(format!("cannot create plot dir {:?}", dir))?;
    let charts: [(&str, fn(&[RunResult], &Path) -> Result<()>); 5] = [
        ("score.svg", score_bar),
        ("energy_vs_accuracy.svg", energy_vs_accuracy),
        ("roofline.svg", roofline),
        ("energy_breakdown.svg", energy_breakdown),
        ("utilization.svg", utilization),
    ];
    let mut written = vec![];
    for (name, draw) in charts {
        let path = dir.join(name);
        draw(results, &path).wrap_err(format!("fail to draw {name}"))?;
        info!(?path, "chart written");
        written.push(path);
    }
    Ok(written)
}
