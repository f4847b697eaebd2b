//! Static Chart Renderer
//! Renders the county breakdown bar chart to PNG bytes with plotters.

use crate::stats::CategoryCount;
use image::{ImageFormat, RgbImage};
use plotters::prelude::*;
use std::io::Cursor;
use thiserror::Error;

const BAR_FILL: RGBColor = RGBColor(52, 152, 219);

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Drawing failed: {0}")]
    Draw(String),
    #[error("PNG encoding failed: {0}")]
    Encode(#[from] image::ImageError),
}

fn draw_err(e: impl std::fmt::Display) -> RenderError {
    RenderError::Draw(e.to_string())
}

pub struct StaticChartRenderer;

impl StaticChartRenderer {
    /// Render a vertical bar chart, one bar per category, as PNG.
    pub fn render_bar_chart_png(
        counts: &[CategoryCount],
        title: &str,
        width: u32,
        height: u32,
    ) -> Result<Vec<u8>, RenderError> {
        let mut buffer = vec![0u8; (width * height * 3) as usize];
        let n = counts.len().max(1) as u32;
        let y_max = counts.iter().map(|c| c.count).max().unwrap_or(0) as u32;
        // Leave headroom above the tallest bar
        let y_top = y_max + (y_max / 10).max(1);

        {
            let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
            root.fill(&WHITE).map_err(draw_err)?;

            let mut chart = ChartBuilder::on(&root)
                .caption(title, ("sans-serif", 28))
                .margin(20)
                .x_label_area_size(70)
                .y_label_area_size(60)
                .build_cartesian_2d((0u32..n).into_segmented(), 0u32..y_top)
                .map_err(draw_err)?;

            let label_for = |v: &SegmentValue<u32>| match v {
                SegmentValue::CenterOf(i) => counts
                    .get(*i as usize)
                    .map(|c| c.category.clone())
                    .unwrap_or_default(),
                _ => String::new(),
            };

            chart
                .configure_mesh()
                .disable_x_mesh()
                .x_labels(counts.len().max(1))
                .x_label_formatter(&label_for)
                .x_desc("County")
                .y_desc("Count")
                .draw()
                .map_err(draw_err)?;

            chart
                .draw_series(
                    Histogram::vertical(&chart)
                        .style(BAR_FILL.filled())
                        .margin(10)
                        .data(
                            counts
                                .iter()
                                .enumerate()
                                .map(|(i, c)| (i as u32, c.count as u32)),
                        ),
                )
                .map_err(draw_err)?;

            root.present().map_err(draw_err)?;
        }

        let img = RgbImage::from_raw(width, height, buffer)
            .ok_or_else(|| RenderError::Draw("pixel buffer size mismatch".to_string()))?;
        let mut png = Cursor::new(Vec::new());
        img.write_to(&mut png, ImageFormat::Png)?;
        Ok(png.into_inner())
    }
}
