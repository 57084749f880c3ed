//! Min/mean/max envelope per scenario family. Collapses the scenario fan
//! into one shaded band and one mean line per family.

use anyhow::Result;
use indexmap::IndexMap;
use plotters::coord::Shift;
use plotters::prelude::*;

use crate::charts::context::{draw_empty, ChartContext};
use crate::charts::registry::{Audience, ChartSpec};
use crate::charts::style::{family_color, value_axis, TierStyle};
use crate::core::dataset::Dataset;
use crate::render_targets;

const NAME: &str = "family_bands";
const TITLE: &str = "Emission envelopes by scenario family";

pub fn register(charts: &mut Vec<ChartSpec>) {
    charts.push(ChartSpec {
        name: NAME,
        title: TITLE,
        audience: Audience::Results,
        generate,
    });
}

struct Band {
    family: String,
    /// (year, min, mean, max) of the scenario totals in this family.
    points: Vec<(u32, f64, f64, f64)>,
}

struct Table {
    bands: Vec<Band>,
}

fn build_table(dataset: &Dataset) -> Table {
    let totals = dataset.sum_co2eq_by(|r| (r.scenario.clone(), r.year));
    let mut family_of: IndexMap<String, String> = IndexMap::new();
    for record in dataset.records() {
        family_of
            .entry(record.scenario.clone())
            .or_insert_with(|| record.scenario_family.clone());
    }

    let mut cells: IndexMap<(String, u32), Vec<f64>> = IndexMap::new();
    for ((scenario, year), co2eq) in totals {
        let family = family_of[&scenario].clone();
        cells.entry((family, year)).or_default().push(co2eq);
    }

    let mut bands = Vec::new();
    for family in dataset.families() {
        let mut points: Vec<(u32, f64, f64, f64)> = Vec::new();
        for ((cell_family, year), values) in &cells {
            if *cell_family != family {
                continue;
            }
            let min = values.iter().copied().fold(f64::INFINITY, f64::min);
            let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let mean = values.iter().sum::<f64>() / values.len() as f64;
            points.push((*year, min, mean, max));
        }
        points.sort_unstable_by_key(|(year, ..)| *year);
        if !points.is_empty() {
            bands.push(Band { family, points });
        }
    }
    Table { bands }
}

fn generate(dataset: &Dataset, ctx: &ChartContext) -> Result<()> {
    let table = build_table(dataset);
    if table.bands.is_empty() {
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

    let stroke = style.stroke_width();
    for band in &table.bands {
        let color = family_color(&band.family);
        let mut outline: Vec<(f64, f64)> = band
            .points
            .iter()
            .map(|(year, _, _, max)| (f64::from(*year), *max))
            .collect();
        outline.extend(
            band.points
                .iter()
                .rev()
                .map(|(year, min, _, _)| (f64::from(*year), *min)),
        );
        chart.draw_series(std::iter::once(Polygon::new(
            outline,
            color.mix(0.15).filled(),
        )))?;

        chart
            .draw_series(LineSeries::new(
                band.points
                    .iter()
                    .map(|(year, _, mean, _)| (f64::from(*year), *mean)),
                color.stroke_width(stroke),
            ))?
            .label(band.family.as_str())
            .legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 18, y)], color.stroke_width(stroke))
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

fn axis_ranges(table: &Table) -> (std::ops::Range<f64>, std::ops::Range<f64>) {
    let mut year_lo = u32::MAX;
    let mut year_hi = u32::MIN;
    let mut y_lo = f64::INFINITY;
    let mut y_hi = f64::NEG_INFINITY;
    for band in &table.bands {
        for (year, min, _, max) in &band.points {
            year_lo = year_lo.min(*year);
            year_hi = year_hi.max(*year);
            y_lo = y_lo.min(*min);
            y_hi = y_hi.max(*max);
        }
    }
    value_axis(f64::from(year_lo), f64::from(year_hi), y_lo, y_hi)
}

fn write_extract(ctx: &ChartContext, table: &Table) -> Result<()> {
    let mut rows = Vec::new();
    for band in &table.bands {
        for (year, min, mean, max) in &band.points {
            rows.push(vec![
                band.family.clone(),
                year.to_string(),
                format!("{}", min),
                format!("{}", mean),
                format!("{}", max),
            ]);
        }
    }
    ctx.write_extract(
        &["ScenarioFamily", "Year", "MinCO2eq", "MeanCO2eq", "MaxCO2eq"],
        &rows,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::test_fixtures::fixture_dataset;

    #[test]
    fn one_band_per_family_sorted_by_year() {
        let dataset = fixture_dataset();
        let table = build_table(&dataset);
        let families: Vec<&str> = table.bands.iter().map(|b| b.family.as_str()).collect();
        assert_eq!(
            families,
            dataset.families().iter().map(String::as_str).collect::<Vec<_>>()
        );
        for band in &table.bands {
            let years: Vec<u32> = band.points.iter().map(|(y, ..)| *y).collect();
            let mut sorted = years.clone();
            sorted.sort_unstable();
            assert_eq!(years, sorted);
        }
    }

    #[test]
    fn single_scenario_family_collapses_to_its_total() {
        let table = build_table(&fixture_dataset());
        let band = table.bands.iter().find(|b| b.family == "PAM1").unwrap();
        for (_, min, mean, max) in &band.points {
            assert_eq!(min, max);
            assert_eq!(min, mean);
        }
    }

    #[test]
    fn envelope_orders_min_mean_max() {
        let table = build_table(&fixture_dataset());
        for band in &table.bands {
            for (_, min, mean, max) in &band.points {
                assert!(min <= mean && mean <= max);
            }
        }
    }
}
