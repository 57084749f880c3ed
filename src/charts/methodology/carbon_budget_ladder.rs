//! The carbon budget ladder: every budget tier in ascending order, the
//! scenarios sitting on each rung, and the unbudgeted runs on top.

use anyhow::Result;
use indexmap::IndexMap;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use crate::charts::context::{draw_empty, ChartContext};
use crate::charts::registry::{Audience, ChartSpec};
use crate::charts::style::{index_label, TierStyle, PALETTE, SCENARIO_GRAY};
use crate::config::constants::NO_BUDGET_LABEL;
use crate::core::dataset::Dataset;
use crate::models::record::budget_label;
use crate::models::scenario::BUDGET_TIERS;
use crate::render_targets;

const NAME: &str = "carbon_budget_ladder";
const TITLE: &str = "Scenarios by carbon budget tier";

pub fn register(charts: &mut Vec<ChartSpec>) {
    charts.push(ChartSpec {
        name: NAME,
        title: TITLE,
        audience: Audience::Methodology,
        generate,
    });
}

struct Table {
    /// (tier label, scenario codes), ascending by budget with the
    /// unbudgeted rung last.
    rungs: Vec<(String, Vec<String>)>,
}

fn build_table(dataset: &Dataset) -> Table {
    let mut budget_of: IndexMap<String, Option<f64>> = IndexMap::new();
    for record in dataset.records() {
        budget_of
            .entry(record.scenario.clone())
            .or_insert(record.carbon_budget);
    }

    let mut rungs = Vec::new();
    for gt in BUDGET_TIERS.values() {
        let label = budget_label(Some(*gt));
        let codes: Vec<String> = budget_of
            .iter()
            .filter(|(_, budget)| budget_label(**budget) == label)
            .map(|(code, _)| code.clone())
            .collect();
        if !codes.is_empty() {
            rungs.push((label, codes));
        }
    }
    let unbudgeted: Vec<String> = budget_of
        .iter()
        .filter(|(_, budget)| budget.is_none())
        .map(|(code, _)| code.clone())
        .collect();
    if !unbudgeted.is_empty() {
        rungs.push((NO_BUDGET_LABEL.to_string(), unbudgeted));
    }
    Table { rungs }
}

fn generate(dataset: &Dataset, ctx: &ChartContext) -> Result<()> {
    let table = build_table(dataset);
    if table.rungs.is_empty() {
        render_targets!(ctx, NAME, |area, style| draw_empty(
            &area,
            style,
            TITLE,
            "no scenarios to place"
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
    let labels: Vec<String> = table.rungs.iter().map(|(label, _)| label.clone()).collect();
    let y_fmt = index_label(&labels);
    let max_count = table
        .rungs
        .iter()
        .map(|(_, codes)| codes.len())
        .max()
        .unwrap_or(1) as f64;

    let mut chart = ChartBuilder::on(area)
        .caption(TITLE, style.title_font())
        .margin(style.margin())
        .x_label_area_size(style.x_label_area())
        .y_label_area_size(style.y_label_area())
        .build_cartesian_2d(
            0.0..max_count * 1.6,
            -0.5..(table.rungs.len() as f64 - 0.5),
        )?;

    chart
        .configure_mesh()
        .disable_y_mesh()
        .x_desc("Scenarios")
        .y_desc("Carbon budget (Gt)")
        .label_style(style.label_font())
        .axis_desc_style(style.label_font())
        .y_labels(table.rungs.len().max(2))
        .y_label_formatter(&y_fmt)
        .x_label_formatter(&|x| {
            if (x - x.round()).abs() < 0.01 {
                format!("{}", x.round() as i64)
            } else {
                String::new()
            }
        })
        .light_line_style(&WHITE.mix(0.0))
        .draw()?;

    chart.draw_series(table.rungs.iter().enumerate().map(|(i, (label, codes))| {
        let color = if label == NO_BUDGET_LABEL {
            SCENARIO_GRAY
        } else {
            PALETTE[0]
        };
        Rectangle::new(
            [
                (0.0, i as f64 - 0.35),
                (codes.len() as f64, i as f64 + 0.35),
            ],
            color.filled(),
        )
    }))?;

    let code_style = TextStyle::from(style.legend_font().into_font())
        .pos(Pos::new(HPos::Left, VPos::Center));
    chart.draw_series(table.rungs.iter().enumerate().map(|(i, (_, codes))| {
        Text::new(
            codes.join(", "),
            (codes.len() as f64 + max_count * 0.04, i as f64),
            code_style.clone(),
        )
    }))?;
    Ok(())
}

fn write_extract(ctx: &ChartContext, table: &Table) -> Result<()> {
    let mut rows = Vec::new();
    for (label, codes) in &table.rungs {
        for code in codes {
            rows.push(vec![label.clone(), code.clone()]);
        }
    }
    ctx.write_extract(&["CarbonBudgetGt", "Scenario"], &rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::test_fixtures::fixture_dataset;

    #[test]
    fn rungs_ascend_with_the_unbudgeted_on_top() {
        let table = build_table(&fixture_dataset());
        let labels: Vec<&str> = table.rungs.iter().map(|(l, _)| l.as_str()).collect();
        assert_eq!(labels, ["7.5", "9.5", "NoBudget"]);
    }

    #[test]
    fn every_scenario_lands_on_exactly_one_rung() {
        let dataset = fixture_dataset();
        let table = build_table(&dataset);
        let mut placed: Vec<String> = table
            .rungs
            .iter()
            .flat_map(|(_, codes)| codes.iter().cloned())
            .collect();
        placed.sort();
        let mut expected = dataset.scenarios();
        expected.sort();
        assert_eq!(placed, expected);
    }

    #[test]
    fn unbudgeted_rung_collects_the_right_codes() {
        let table = build_table(&fixture_dataset());
        let (label, codes) = table.rungs.last().unwrap();
        assert_eq!(label, "NoBudget");
        assert_eq!(codes, &["REF-RG", "PAM4", "HCARB-HG"]);
    }
}
