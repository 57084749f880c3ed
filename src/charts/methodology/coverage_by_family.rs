//! Processed row counts per scenario family. A thin family here usually
//! means a filtered export, not a thin pathway.

use anyhow::Result;
use plotters::coord::Shift;
use plotters::prelude::*;

use crate::charts::context::{draw_empty, ChartContext};
use crate::charts::registry::{Audience, ChartSpec};
use crate::charts::style::{family_color, index_label, TierStyle};
use crate::core::dataset::Dataset;
use crate::render_targets;

const NAME: &str = "coverage_by_family";
const TITLE: &str = "Dataset rows by scenario family";

pub fn register(charts: &mut Vec<ChartSpec>) {
    charts.push(ChartSpec {
        name: NAME,
        title: TITLE,
        audience: Audience::Methodology,
        generate,
    });
}

struct Table {
    families: Vec<(String, usize)>,
}

fn build_table(dataset: &Dataset) -> Table {
    let families = dataset
        .families()
        .into_iter()
        .map(|family| {
            let rows = dataset
                .records()
                .iter()
                .filter(|r| r.scenario_family == family)
                .count();
            (family, rows)
        })
        .collect();
    Table { families }
}

fn generate(dataset: &Dataset, ctx: &ChartContext) -> Result<()> {
    let table = build_table(dataset);
    if table.families.is_empty() {
        render_targets!(ctx, NAME, |area, style| draw_empty(
            &area,
            style,
            TITLE,
            "no processed rows"
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
    let labels: Vec<String> = table.families.iter().map(|(f, _)| f.clone()).collect();
    let fmt = index_label(&labels);
    let top = table
        .families
        .iter()
        .map(|(_, rows)| *rows)
        .max()
        .unwrap_or(0) as f64;

    let mut chart = ChartBuilder::on(area)
        .caption(TITLE, style.title_font())
        .margin(style.margin())
        .x_label_area_size(style.x_label_area())
        .y_label_area_size(style.y_label_area())
        .build_cartesian_2d(
            -0.5..(table.families.len() as f64 - 0.5),
            0.0..(top * 1.1).max(1.0),
        )?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc("Scenario family")
        .y_desc("Rows")
        .label_style(style.label_font())
        .axis_desc_style(style.label_font())
        .x_labels(table.families.len().max(2))
        .x_label_formatter(&fmt)
        .light_line_style(&WHITE.mix(0.0))
        .draw()?;

    chart.draw_series(table.families.iter().enumerate().map(|(i, (family, rows))| {
        Rectangle::new(
            [(i as f64 - 0.35, 0.0), (i as f64 + 0.35, *rows as f64)],
            family_color(family).filled(),
        )
    }))?;
    Ok(())
}

fn write_extract(ctx: &ChartContext, table: &Table) -> Result<()> {
    let rows: Vec<Vec<String>> = table
        .families
        .iter()
        .map(|(family, rows)| vec![family.clone(), rows.to_string()])
        .collect();
    ctx.write_extract(&["ScenarioFamily", "Rows"], &rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::test_fixtures::fixture_dataset;

    #[test]
    fn counts_rows_per_family_in_first_appearance_order() {
        let table = build_table(&fixture_dataset());
        let names: Vec<&str> = table.families.iter().map(|(f, _)| f.as_str()).collect();
        assert_eq!(names, ["WEM", "PAM1", "PAM2", "PAM4", "High Carbon"]);
        // Rows stay keyed per sector, so four years and four sectors each.
        for (_, rows) in &table.families {
            assert_eq!(*rows, 16);
        }
    }
}
