//! Total CO2eq by year, one muted line per scenario. The classic
//! all-pathways fan that opens the results section.

use anyhow::Result;
use plotters::coord::Shift;
use plotters::prelude::*;

use crate::charts::context::{draw_empty, ChartContext};
use crate::charts::registry::{Audience, ChartSpec};
use crate::charts::style::{value_axis, TierStyle, SCENARIO_GRAY};
use crate::core::dataset::Dataset;
use crate::render_targets;

const NAME: &str = "total_emissions";
const TITLE: &str = "Total emissions, all scenarios";

pub fn register(charts: &mut Vec<ChartSpec>) {
    charts.push(ChartSpec {
        name: NAME,
        title: TITLE,
        audience: Audience::Results,
        generate,
    });
}

struct Table {
    series: Vec<(String, Vec<(u32, f64)>)>,
}

fn build_table(dataset: &Dataset) -> Table {
    let totals = dataset.sum_co2eq_by(|r| (r.scenario.clone(), r.year));
    let mut series: Vec<(String, Vec<(u32, f64)>)> = Vec::new();
    for ((scenario, year), co2eq) in totals {
        match series.iter_mut().find(|(code, _)| *code == scenario) {
            Some((_, points)) => points.push((year, co2eq)),
            None => series.push((scenario, vec![(year, co2eq)])),
        }
    }
    for (_, points) in &mut series {
        points.sort_unstable_by_key(|(year, _)| *year);
    }
    Table { series }
}

fn generate(dataset: &Dataset, ctx: &ChartContext) -> Result<()> {
    let table = build_table(dataset);
    if table.series.is_empty() {
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
    let (x_range, y_range) = axis_ranges(table);

    let mut chart = ChartBuilder::on(area)
        .caption(TITLE, style.title_font())
        .margin(style.margin())
        .x_label_area_size(style.x_label_area())
        .y_label_area_size(style.y_label_area())
        .build_cartesian_2d(x_range, y_range)?;

    chart
        .configure_mesh()
        .x_desc("Year")
        .y_desc("CO2eq (kt)")
        .label_style(style.label_font())
        .axis_desc_style(style.label_font())
        .x_label_formatter(&|year| format!("{}", *year as i64))
        .light_line_style(&WHITE.mix(0.0))
        .draw()?;

    let stroke = style.thin_stroke();
    for (_, points) in &table.series {
        chart.draw_series(LineSeries::new(
            points.iter().map(|(year, co2eq)| (f64::from(*year), *co2eq)),
            SCENARIO_GRAY.stroke_width(stroke),
        ))?;
    }
    Ok(())
}

fn axis_ranges(table: &Table) -> (std::ops::Range<f64>, std::ops::Range<f64>) {
    let mut year_lo = u32::MAX;
    let mut year_hi = u32::MIN;
    let mut y_lo = f64::INFINITY;
    let mut y_hi = f64::NEG_INFINITY;
    for (_, points) in &table.series {
        for (year, co2eq) in points {
            year_lo = year_lo.min(*year);
            year_hi = year_hi.max(*year);
            y_lo = y_lo.min(*co2eq);
            y_hi = y_hi.max(*co2eq);
        }
    }
    value_axis(f64::from(year_lo), f64::from(year_hi), y_lo, y_hi)
}

fn write_extract(ctx: &ChartContext, table: &Table) -> Result<()> {
    let mut rows = Vec::new();
    for (scenario, points) in &table.series {
        for (year, co2eq) in points {
            rows.push(vec![scenario.clone(), year.to_string(), format!("{}", co2eq)]);
        }
    }
    ctx.write_extract(&["Scenario", "Year", "CO2eq"], &rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::test_fixtures::{fixture_dataset, fixture_scenario, FIXTURE_YEARS};

    #[test]
    fn single_scenario_collapses_to_one_line() {
        let table = build_table(&fixture_scenario("PAM1-075-RG"));
        assert_eq!(table.series.len(), 1);
        let (code, points) = &table.series[0];
        assert_eq!(code, "PAM1-075-RG");
        let years: Vec<u32> = points.iter().map(|(y, _)| *y).collect();
        assert_eq!(years, FIXTURE_YEARS);
    }

    #[test]
    fn one_series_per_scenario_sorted_by_year() {
        let table = build_table(&fixture_dataset());
        assert_eq!(table.series.len(), fixture_dataset().scenarios().len());
        for (_, points) in &table.series {
            let years: Vec<u32> = points.iter().map(|(y, _)| *y).collect();
            let mut sorted = years.clone();
            sorted.sort_unstable();
            assert_eq!(years, sorted);
        }
    }

    #[test]
    fn series_totals_sum_sectors() {
        let dataset = fixture_dataset();
        let table = build_table(&dataset);
        let (_, points) = table
            .series
            .iter()
            .find(|(code, _)| code == "REF-RG")
            .unwrap();
        let expected: f64 = dataset
            .records()
            .iter()
            .filter(|r| r.scenario == "REF-RG" && r.year == points[0].0)
            .map(|r| r.co2eq)
            .sum();
        assert_eq!(points[0].1, expected);
    }
}
