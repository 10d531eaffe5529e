//! Category frequency bar chart, rendered as an inline SVG document.

use askama::Template;

use crate::db::CategoryCount;

const WIDTH: f64 = 640.0;
const HEIGHT: f64 = 480.0;
const MARGIN_LEFT: f64 = 70.0;
const MARGIN_RIGHT: f64 = 20.0;
const MARGIN_TOP: f64 = 50.0;
// Rotated category labels hang below the axis.
const MARGIN_BOTTOM: f64 = 200.0;
const BAR_FILL: f64 = 0.8;

#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub label: String,
    pub count: i64,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub label_x: f64,
    pub label_y: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    pub value: i64,
    pub y: f64,
}

#[derive(Debug, Clone, Template)]
#[template(path = "chart.svg", escape = "html")]
pub struct BarChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub width: f64,
    pub height: f64,
    pub plot_left: f64,
    pub plot_top: f64,
    pub plot_right: f64,
    pub plot_bottom: f64,
    pub y_max: i64,
    pub bars: Vec<Bar>,
    pub ticks: Vec<Tick>,
}

/// Smallest step from the 1-2-5 series giving at most five intervals.
fn nice_step(max: i64) -> i64 {
    let target = max as f64 / 5.0;
    let mut magnitude = 1;
    loop {
        for multiple in [1, 2, 5] {
            if (multiple * magnitude) as f64 >= target {
                return multiple * magnitude;
            }
        }
        magnitude *= 10;
    }
}

impl BarChart {
    pub fn from_counts(counts: &[CategoryCount]) -> Self {
        let plot_left = MARGIN_LEFT;
        let plot_top = MARGIN_TOP;
        let plot_right = WIDTH - MARGIN_RIGHT;
        let plot_bottom = HEIGHT - MARGIN_BOTTOM;
        let plot_width = plot_right - plot_left;
        let plot_height = plot_bottom - plot_top;

        let max = counts.iter().map(|c| c.count).max().unwrap_or(0);
        let step = nice_step(max);
        let y_max = ((max + step - 1) / step).max(1) * step;
        let scale = plot_height / y_max as f64;

        let slot = if counts.is_empty() {
            0.0
        } else {
            plot_width / counts.len() as f64
        };

        let bars = counts
            .iter()
            .enumerate()
            .map(|(i, c)| {
                let width = slot * BAR_FILL;
                let x = plot_left + slot * i as f64 + (slot - width) / 2.0;
                let height = c.count as f64 * scale;
                Bar {
                    label: c.category.clone(),
                    count: c.count,
                    x,
                    y: plot_bottom - height,
                    width,
                    height,
                    label_x: x + width / 2.0,
                    label_y: plot_bottom + 14.0,
                }
            })
            .collect();

        let ticks = (0..=y_max)
            .step_by(step as usize)
            .map(|value| Tick {
                value,
                y: plot_bottom - value as f64 * scale,
            })
            .collect();

        Self {
            title: "Category Frequency Plot".to_string(),
            x_label: "Category".to_string(),
            y_label: "Frequency".to_string(),
            width: WIDTH,
            height: HEIGHT,
            plot_left,
            plot_top,
            plot_right,
            plot_bottom,
            y_max,
            bars,
            ticks,
        }
    }

    pub fn render_svg(&self) -> askama::Result<String> {
        self.render()
    }

    pub fn plot_center_x(&self) -> f64 {
        (self.plot_left + self.plot_right) / 2.0
    }

    pub fn plot_center_y(&self) -> f64 {
        (self.plot_top + self.plot_bottom) / 2.0
    }
}
