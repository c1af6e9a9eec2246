//! This module renders the dashboard and production charts to PNG files.

use anyhow::Result;
use aquaforge_core::simulation::state::HistoryBuffer;
use aquaforge_schemas::reading::Parameter;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::path::Path;

type Panel<'a> = DrawingArea<BitMapBackend<'a>, Shift>;

/// Per-kind totals plotted by the production view.
#[derive(Debug, Clone, PartialEq)]
pub struct KindTotals {
    pub kind: String,
    pub harvest: f64,
    pub sales: f64,
    pub cost: f64,
    pub profit: f64,
}

/// Redraws the live dashboard: a 2x3 grid of the rolling history.
pub fn draw_live_dashboard(output_dir: &str, history: &HistoryBuffer) -> Result<()> {
    let path = Path::new(output_dir).join("live_dashboard.png");
    let root = BitMapBackend::new(&path, (1500, 800)).into_drawing_area();
    root.fill(&WHITE)?;
    let root = root.titled(
        "Real-Time Monitoring of the Aquaponic System",
        ("sans-serif", 28).into_font(),
    )?;

    let panels = root.split_evenly((2, 3));
    let x_max = history.capacity().max(history.len()).max(2);

    let oxygen = history.series(Parameter::DissolvedOxygen);
    plot_area_series(&panels[0], "Dissolved Oxygen", &oxygen, x_max, RGBColor(0, 100, 255))?;
    plot_temperatures(&panels[1], history, x_max)?;
    plot_water_level(&panels[2], &history.series(Parameter::WaterLevel), x_max)?;
    let humidity = history.series(Parameter::AmbientHumidity);
    let green = RGBColor(0, 255, 100).mix(0.6);
    plot_bars(&panels[3], "Humidity", &humidity, x_max, green)?;
    plot_feed(&panels[4], &history.series(Parameter::FeedQuantity), x_max)?;

    root.present()?;
    Ok(())
}

/// Value range with a little headroom; a flat series still gets a visible band.
fn y_bounds<'a, I>(values: I) -> (f64, f64)
where
    I: IntoIterator<Item = &'a f64>,
{
    let (lo, hi) = values
        .into_iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(*v), hi.max(*v)));
    if !lo.is_finite() || !hi.is_finite() {
        return (0.0, 1.0);
    }
    let pad = ((hi - lo) * 0.1).max(hi.abs() * 0.05).max(0.5);
    (lo - pad, hi + pad)
}

fn values(series: &[(usize, f64)]) -> impl Iterator<Item = &f64> {
    series.iter().map(|(_, v)| v)
}

fn plot_area_series(
    area: &Panel,
    title: &str,
    series: &[(usize, f64)],
    x_max: usize,
    color: RGBColor,
) -> Result<()> {
    let (_, hi) = y_bounds(values(series));
    let mut chart = ChartBuilder::on(area)
        .caption(title, ("sans-serif", 20).into_font())
        .margin(10)
        .x_label_area_size(25)
        .y_label_area_size(40)
        .build_cartesian_2d(0usize..x_max, 0f64..hi.max(1.0))?;
    chart.configure_mesh().draw()?;
    chart.draw_series(
        AreaSeries::new(series.iter().copied(), 0.0, color.mix(0.3))
            .border_style(color.stroke_width(2)),
    )?;
    Ok(())
}

fn plot_temperatures(area: &Panel, history: &HistoryBuffer, x_max: usize) -> Result<()> {
    let water = history.series(Parameter::WaterTemperature);
    let ambient = history.series(Parameter::AmbientTemperature);
    let (lo, hi) = y_bounds(values(&water).chain(values(&ambient)));

    let mut chart = ChartBuilder::on(area)
        .caption("Temperatures", ("sans-serif", 20).into_font())
        .margin(10)
        .x_label_area_size(25)
        .y_label_area_size(40)
        .build_cartesian_2d(0usize..x_max, lo..hi)?;
    chart.configure_mesh().y_desc("°C").draw()?;

    chart
        .draw_series(LineSeries::new(water.iter().copied(), BLUE.stroke_width(2)))?
        .label("Water")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE.filled()));
    chart
        .draw_series(LineSeries::new(ambient.iter().copied(), RED.stroke_width(2)))?
        .label("Ambient")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED.filled()));

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;
    Ok(())
}

/// Scatter whose marker colour follows the value (low = purple, high = yellow).
fn plot_water_level(area: &Panel, series: &[(usize, f64)], x_max: usize) -> Result<()> {
    let (lo, hi) = y_bounds(values(series));
    let mut chart = ChartBuilder::on(area)
        .caption("Water Level", ("sans-serif", 20).into_font())
        .margin(10)
        .x_label_area_size(25)
        .y_label_area_size(40)
        .build_cartesian_2d(0usize..x_max, lo..hi)?;
    chart.configure_mesh().y_desc("cm").draw()?;

    let span = (hi - lo).max(f64::EPSILON);
    chart.draw_series(series.iter().map(|&(x, y)| {
        let t = ((y - lo) / span).clamp(0.0, 1.0);
        let color = HSLColor(0.75 - 0.6 * t, 0.8, 0.45);
        Circle::new((x, y), 5, color.filled())
    }))?;
    Ok(())
}

fn plot_bars(
    area: &Panel,
    title: &str,
    series: &[(usize, f64)],
    x_max: usize,
    style: RGBAColor,
) -> Result<()> {
    let (_, hi) = y_bounds(values(series));
    let mut chart = ChartBuilder::on(area)
        .caption(title, ("sans-serif", 20).into_font())
        .margin(10)
        .x_label_area_size(25)
        .y_label_area_size(40)
        .build_cartesian_2d(0usize..x_max + 1, 0f64..hi.max(1.0))?;
    chart.configure_mesh().draw()?;
    chart.draw_series(
        series
            .iter()
            .map(|&(x, y)| Rectangle::new([(x, 0.0), (x + 1, y)], style.filled())),
    )?;
    Ok(())
}

/// Feed quantity as translucent bars with a line on top.
fn plot_feed(area: &Panel, series: &[(usize, f64)], x_max: usize) -> Result<()> {
    let orange = RGBColor(255, 165, 0);
    let (_, hi) = y_bounds(values(series));
    let mut chart = ChartBuilder::on(area)
        .caption("Feeding", ("sans-serif", 20).into_font())
        .margin(10)
        .x_label_area_size(25)
        .y_label_area_size(40)
        .build_cartesian_2d(0usize..x_max + 1, 0f64..hi.max(1.0))?;
    chart.configure_mesh().y_desc("g").draw()?;
    chart.draw_series(
        series
            .iter()
            .map(|&(x, y)| Rectangle::new([(x, 0.0), (x + 1, y)], orange.mix(0.3).filled())),
    )?;
    chart.draw_series(LineSeries::new(series.iter().copied(), orange.stroke_width(2)))?;
    Ok(())
}

/// Grouped bars of harvest vs. sales per production kind.
pub fn plot_harvest_vs_sales(output_dir: &str, totals: &[KindTotals]) -> Result<()> {
    let path = Path::new(output_dir).join("harvest_vs_sales.png");
    let root = BitMapBackend::new(&path, (1024, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let max_value = totals
        .iter()
        .flat_map(|t| [t.harvest, t.sales])
        .fold(0.0, f64::max);
    let kinds = totals.len().max(1);

    let mut chart = ChartBuilder::on(&root)
        .caption("Harvest vs Sales", ("sans-serif", 40).into_font())
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(0f64..kinds as f64, 0f64..(max_value * 1.1).max(1.0))?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(kinds)
        .x_label_formatter(&|x| kind_label(totals, *x))
        .x_desc("Type")
        .y_desc("Quantity (kg)")
        .draw()?;

    chart
        .draw_series(totals.iter().enumerate().map(|(i, t)| {
            let x = i as f64;
            Rectangle::new([(x + 0.1, 0.0), (x + 0.45, t.harvest)], BLUE.mix(0.7).filled())
        }))?
        .label("cantidad_cosecha")
        .legend(|(x, y)| Rectangle::new([(x, y - 5), (x + 15, y + 5)], BLUE.mix(0.7).filled()));
    chart
        .draw_series(totals.iter().enumerate().map(|(i, t)| {
            let x = i as f64;
            Rectangle::new([(x + 0.55, 0.0), (x + 0.9, t.sales)], GREEN.mix(0.7).filled())
        }))?
        .label("venta_kg")
        .legend(|(x, y)| Rectangle::new([(x, y - 5), (x + 15, y + 5)], GREEN.mix(0.7).filled()));

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;
    root.present()?;
    Ok(())
}

/// Cost and profit per production kind as point-marked lines.
pub fn plot_cost_and_profit(output_dir: &str, totals: &[KindTotals]) -> Result<()> {
    let path = Path::new(output_dir).join("cost_and_profit.png");
    let root = BitMapBackend::new(&path, (1024, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let (lo, hi) = y_bounds(totals.iter().flat_map(|t| [&t.cost, &t.profit]));
    let kinds = totals.len().max(1);

    let mut chart = ChartBuilder::on(&root)
        .caption("Cost and Profit Trend", ("sans-serif", 40).into_font())
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .build_cartesian_2d(-0.5f64..kinds as f64 - 0.5, lo.min(0.0)..hi)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(kinds)
        .x_label_formatter(&|x| kind_label(totals, *x + 0.5))
        .x_desc("Type")
        .y_desc("Value ($)")
        .draw()?;

    let points = |value: fn(&KindTotals) -> f64| -> Vec<(f64, f64)> {
        totals.iter().enumerate().map(|(i, t)| (i as f64, value(t))).collect()
    };
    let cost = points(|t| t.cost);
    let profit = points(|t| t.profit);

    for (name, color, points) in [("costo_produccion", RED, cost), ("ganancia", GREEN, profit)] {
        chart
            .draw_series(LineSeries::new(points.clone(), color.stroke_width(2)))?
            .label(name)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.filled()));
        chart.draw_series(points.into_iter().map(|p| Circle::new(p, 4, color.filled())))?;
    }

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;
    root.present()?;
    Ok(())
}

fn kind_label(totals: &[KindTotals], x: f64) -> String {
    let index = x.floor();
    if index < 0.0 {
        return String::new();
    }
    totals
        .get(index as usize)
        .map(|t| t.kind.clone())
        .unwrap_or_default()
}
