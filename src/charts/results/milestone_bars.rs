//! Grouped bars of mean family emissions at the milestone years. The
//! side-by-side comparison used in summary slides.

use anyhow::Result;
use indexmap::IndexMap;
use plotters::coord::Shift;
use plotters::prelude::*;

use crate::charts::context::{draw_empty, ChartContext};
use crate::charts::registry::{Audience, ChartSpec};
use crate::charts::style::{family_color, index_label, TierStyle};
use crate::config::constants::MILESTONE_YEARS;
use crate::core::dataset::Dataset;
use crate::render_targets;

const NAME: &str = "milestone_bars";
const TITLE: &str = "Mean family emissions at milestone years";

pub fn register(charts: &mut Vec<ChartSpec>) {
    charts.push(ChartSpec {
        name: NAME,
        title: TITLE,
        audience: Audience::Results,
        generate,
    });
}

struct Table {
    years: Vec<u32>,
    families: Vec<String>,
    /// `means[f][y]` is the mean scenario total for family `f` at
    /// `years[y]`, or `None` when the family has no data that year.
    means: Vec<Vec<Option<f64>>>,
}

fn build_table(dataset: &Dataset) -> Table {
    let data_years = dataset.years();
    let years: Vec<u32> = MILESTONE_YEARS
        .iter()
        .copied()
        .filter(|y| data_years.contains(y))
        .collect();
    let families = dataset.families();

    let mut family_of: IndexMap<String, String> = IndexMap::new();
    for record in dataset.records() {
        family_of
            .entry(record.scenario.clone())
            .or_insert_with(|| record.scenario_family.clone());
    }

    let mut cells: IndexMap<(String, u32), (f64, usize)> = IndexMap::new();
    for ((scenario, year), co2eq) in dataset.sum_co2eq_by(|r| (r.scenario.clone(), r.year)) {
        let family = family_of[&scenario].clone();
        let cell = cells.entry((family, year)).or_insert((0.0, 0));
        cell.0 += co2eq;
        cell.1 += 1;
    }

    let means = families
        .iter()
        .map(|family| {
            years
                .iter()
                .map(|year| {
                    cells
                        .get(&(family.clone(), *year))
                        .map(|(sum, count)| *sum / *count as f64)
                })
                .collect()
        })
        .collect();
    Table { years, families, means }
}

fn generate(dataset: &Dataset, ctx: &ChartContext) -> Result<()> {
    let table = build_table(dataset);
    if table.years.is_empty() || table.families.is_empty() {
        render_targets!(ctx, NAME, |area, style| draw_empty(
            &area,
            style,
            TITLE,
            "no milestone years in the dataset"
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
    let labels: Vec<String> = table.years.iter().map(|y| y.to_string()).collect();
    let fmt = index_label(&labels);
    let top = table
        .means
        .iter()
        .flatten()
        .filter_map(|v| *v)
        .fold(0.0, f64::max);

    let mut chart = ChartBuilder::on(area)
        .caption(TITLE, style.title_font())
        .margin(style.margin())
        .x_label_area_size(style.x_label_area())
        .y_label_area_size(style.y_label_area())
        .build_cartesian_2d(
            -0.5..(table.years.len() as f64 - 0.5),
            0.0..(top * 1.08).max(1.0),
        )?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc("Milestone year")
        .y_desc("Mean CO2eq (kt)")
        .label_style(style.label_font())
        .axis_desc_style(style.label_font())
        .x_labels(table.years.len().max(2))
        .x_label_formatter(&fmt)
        .light_line_style(&WHITE.mix(0.0))
        .draw()?;

    let slot = 0.8 / table.families.len() as f64;
    for (f, family) in table.families.iter().enumerate() {
        let color = family_color(family);
        chart
            .draw_series(table.means[f].iter().enumerate().filter_map(|(m, mean)| {
                mean.map(|value| {
                    let x0 = m as f64 - 0.4 + f as f64 * slot;
                    Rectangle::new([(x0, 0.0), (x0 + slot * 0.9, value)], color.filled())
                })
            }))?
            .label(family.as_str())
            .legend(move |(x, y)| {
                Rectangle::new([(x, y - 6), (x + 14, y + 6)], color.filled())
            });
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(&WHITE.mix(0.85))
        .border_style(&BLACK.mix(0.3))
        .label_font(style.legend_font())
        .draw()?;
    Ok(())
}

fn write_extract(ctx: &ChartContext, table: &Table) -> Result<()> {
    let mut rows = Vec::new();
    for (f, family) in table.families.iter().enumerate() {
        for (y, year) in table.years.iter().enumerate() {
            if let Some(mean) = table.means[f][y] {
                rows.push(vec![year.to_string(), family.clone(), format!("{}", mean)]);
            }
        }
    }
    ctx.write_extract(&["Year", "ScenarioFamily", "MeanCO2eq"], &rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::test_fixtures::fixture_dataset;

    #[test]
    fn keeps_only_milestone_years_present_in_the_data() {
        let table = build_table(&fixture_dataset());
        assert_eq!(table.years, [2030, 2040, 2050]);
    }

    #[test]
    fn single_scenario_family_mean_is_its_total() {
        let dataset = fixture_dataset();
        let table = build_table(&dataset);
        let f = table.families.iter().position(|f| f == "PAM1").unwrap();
        let y = table.years.iter().position(|y| *y == 2030).unwrap();
        let expected: f64 = dataset
            .records()
            .iter()
            .filter(|r| r.scenario == "PAM1-075-RG" && r.year == 2030)
            .map(|r| r.co2eq)
            .sum();
        assert_eq!(table.means[f][y], Some(expected));
    }

    #[test]
    fn empty_dataset_yields_no_milestones() {
        let table = build_table(&Dataset::new(Vec::new()));
        assert!(table.years.is_empty());
        assert!(table.families.is_empty());
    }
}
