//! Family-by-growth coverage matrix. One glance answers which corners of
//! the scenario space the model run actually explored.

use anyhow::Result;
use indexmap::IndexMap;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use crate::charts::context::{draw_empty, ChartContext};
use crate::charts::registry::{Audience, ChartSpec};
use crate::charts::style::{index_label, TierStyle, PALETTE};
use crate::core::dataset::Dataset;
use crate::render_targets;

const NAME: &str = "scenario_matrix";
const TITLE: &str = "Scenario coverage by family and growth";

/// Fixed reading order for the growth axis.
const GROWTH_ORDER: [&str; 4] = ["Reference", "Low", "High", "Unknown"];

pub fn register(charts: &mut Vec<ChartSpec>) {
    charts.push(ChartSpec {
        name: NAME,
        title: TITLE,
        audience: Audience::Methodology,
        generate,
    });
}

struct Table {
    families: Vec<String>,
    growths: Vec<String>,
    /// `counts[f][g]` distinct scenarios for `families[f]` and `growths[g]`.
    counts: Vec<Vec<usize>>,
}

fn build_table(dataset: &Dataset) -> Table {
    let families = dataset.families();

    let mut cell_of: IndexMap<String, (String, String)> = IndexMap::new();
    for record in dataset.records() {
        cell_of.entry(record.scenario.clone()).or_insert_with(|| {
            (
                record.scenario_family.clone(),
                record.economic_growth.clone(),
            )
        });
    }

    let growths: Vec<String> = GROWTH_ORDER
        .iter()
        .filter(|g| cell_of.values().any(|(_, growth)| growth == *g))
        .map(|g| g.to_string())
        .collect();

    let mut counts = vec![vec![0usize; growths.len()]; families.len()];
    for (family, growth) in cell_of.values() {
        let f = families.iter().position(|x| x == family);
        let g = growths.iter().position(|x| x == growth);
        if let (Some(f), Some(g)) = (f, g) {
            counts[f][g] += 1;
        }
    }
    Table { families, growths, counts }
}

fn generate(dataset: &Dataset, ctx: &ChartContext) -> Result<()> {
    let table = build_table(dataset);
    if table.families.is_empty() {
        render_targets!(ctx, NAME, |area, style| draw_empty(
            &area,
            style,
            TITLE,
            "no scenarios to tabulate"
        ));
    } else {
        render_targets!(ctx, NAME, |area, style| draw(&area, style, &table));
    }
    write_extract(ctx, &table)
}

fn draw<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    style: &TierStyle,
    table: &Table,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    area.fill(&WHITE)?;
    let x_labels = table.growths.clone();
    let y_labels = table.families.clone();
    let x_fmt = index_label(&x_labels);
    let y_fmt = index_label(&y_labels);

    let mut chart = ChartBuilder::on(area)
        .caption(TITLE, style.title_font())
        .margin(style.margin())
        .x_label_area_size(style.x_label_area())
        .y_label_area_size(style.y_label_area())
        .build_cartesian_2d(
            -0.5..(table.growths.len() as f64 - 0.5),
            -0.5..(table.families.len() as f64 - 0.5),
        )?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .disable_y_mesh()
        .x_desc("Economic growth")
        .y_desc("Scenario family")
        .label_style(style.label_font())
        .axis_desc_style(style.label_font())
        .x_labels(table.growths.len().max(2))
        .y_labels(table.families.len().max(2))
        .x_label_formatter(&x_fmt)
        .y_label_formatter(&y_fmt)
        .draw()?;

    let max_count = table
        .counts
        .iter()
        .flatten()
        .copied()
        .max()
        .unwrap_or(0)
        .max(1);

    chart.draw_series(table.counts.iter().enumerate().flat_map(|(f, row)| {
        row.iter().enumerate().map(move |(g, count)| {
            let ratio = *count as f64 / max_count as f64;
            let shade = if *count == 0 { 0.04 } else { 0.15 + 0.7 * ratio };
            Rectangle::new(
                [
                    (g as f64 - 0.48, f as f64 - 0.48),
                    (g as f64 + 0.48, f as f64 + 0.48),
                ],
                PALETTE[0].mix(shade).filled(),
            )
        })
    }))?;

    let text_style = TextStyle::from(style.label_font().into_font())
        .pos(Pos::new(HPos::Center, VPos::Center));
    chart.draw_series(table.counts.iter().enumerate().flat_map(|(f, row)| {
        row.iter().enumerate().filter(|(_, count)| **count > 0).map({
            let text_style = text_style.clone();
            move |(g, count)| {
                Text::new(
                    count.to_string(),
                    (g as f64, f as f64),
                    text_style.clone(),
                )
            }
        })
    }))?;
    Ok(())
}

fn write_extract(ctx: &ChartContext, table: &Table) -> Result<()> {
    let mut rows = Vec::new();
    for (f, family) in table.families.iter().enumerate() {
        for (g, growth) in table.growths.iter().enumerate() {
            rows.push(vec![
                family.clone(),
                growth.clone(),
                table.counts[f][g].to_string(),
            ]);
        }
    }
    ctx.write_extract(&["ScenarioFamily", "EconomicGrowth", "Scenarios"], &rows)
}
