use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use crate::charts::style::{tier_scale, TierStyle};
use crate::config::constants::DATA_EXTRACT_FILE;
use crate::config::report_config::{ImageFormat, OutputConfig, StyleConfig};

/// Everything a chart generator may consult: its own output directory and
/// the render options resolved from configuration. Generators never read
/// globals or the environment.
#[derive(Debug, Clone)]
pub struct ChartContext {
    chart_dir: PathBuf,
    output: OutputConfig,
    style: StyleConfig,
}

/// One concrete file a generator renders: a tier and format combination.
#[derive(Debug, Clone)]
pub struct RenderTarget {
    pub path: PathBuf,
    pub size: (u32, u32),
    pub format: ImageFormat,
    pub style: TierStyle,
}

impl ChartContext {
    pub fn new(chart_dir: PathBuf, output: OutputConfig, style: StyleConfig) -> Self {
        Self { chart_dir, output, style }
    }

    pub fn chart_dir(&self) -> &Path {
        &self.chart_dir
    }

    /// The tier and format fan-out for a figure stem, in configuration
    /// order: `<stem>_<tier>.<ext>` under the chart directory.
    pub fn targets(&self, stem: &str) -> Vec<RenderTarget> {
        let mut targets = Vec::new();
        for (tier, res) in &self.output.resolutions {
            for format in &self.output.formats {
                targets.push(RenderTarget {
                    path: self
                        .chart_dir
                        .join(format!("{}_{}.{}", stem, tier, format.extension())),
                    size: (res.width, res.height),
                    format: *format,
                    style: TierStyle {
                        font_family: self.style.font_family.clone(),
                        base_font_px: self.style.base_font_px,
                        scale: tier_scale(res.width),
                    },
                });
            }
        }
        targets
    }

    /// Writes the exact table the figure plotted, next to the images.
    pub fn write_extract(&self, header: &[&str], rows: &[Vec<String>]) -> Result<()> {
        let path = self.chart_dir.join(DATA_EXTRACT_FILE);
        let mut writer = csv::Writer::from_path(&path)
            .with_context(|| format!("creating data extract {}", path.display()))?;
        writer.write_record(header)?;
        for row in rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Renders one figure at every configured tier and format. The body runs
/// once per target with `$area` bound to that target's drawing area and
/// `$style` to its resolved tier style.
#[macro_export]
macro_rules! render_targets {
    ($ctx:expr, $stem:expr, |$area:ident, $style:ident| $body:expr) => {
        for target in $ctx.targets($stem) {
            match target.format {
                $crate::config::report_config::ImageFormat::Png => {
                    let $area = ::plotters::prelude::BitMapBackend::new(&target.path, target.size)
                        .into_drawing_area();
                    let $style = &target.style;
                    $body?;
                    $area.present()?;
                }
                $crate::config::report_config::ImageFormat::Svg => {
                    let $area = ::plotters::prelude::SVGBackend::new(&target.path, target.size)
                        .into_drawing_area();
                    let $style = &target.style;
                    $body?;
                    $area.present()?;
                }
            }
        }
    };
}

/// Blank figure with a centered note, for generators whose derived table
/// came out empty. Absence of data is a reportable state, not a crash.
pub fn draw_empty<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    style: &TierStyle,
    title: &str,
    note: &str,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    area.fill(&WHITE)?;
    let (width, height) = area.dim_in_pixel();
    let title_style = TextStyle::from(style.title_font().into_font())
        .pos(Pos::new(HPos::Center, VPos::Top));
    area.draw(&Text::new(
        title.to_string(),
        ((width / 2) as i32, style.margin()),
        title_style,
    ))?;
    let note_color = BLACK.mix(0.55);
    let note_style = TextStyle::from(style.label_font().into_font())
        .color(&note_color)
        .pos(Pos::new(HPos::Center, VPos::Center));
    area.draw(&Text::new(
        note.to_string(),
        ((width / 2) as i32, (height / 2) as i32),
        note_style,
    ))?;
    Ok(())
}
