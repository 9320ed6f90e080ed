// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Precision/recall diagnostic plots (PNG raster and vector PDF)
//!
//! Both backends draw the same figure: cumulative precision and recall
//! curves over distance, with a dashed marker at the threshold. Only the
//! PDF carries text (title, tick labels, legend); the PNG is the quick-look
//! raster with color-coded curves.

use super::precision_recall::PrecisionRecall;
use anyhow::{Context, Result};
use image::{Rgb, RgbImage};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

const PNG_WIDTH: u32 = 800;
const PNG_HEIGHT: u32 = 600;
const PDF_WIDTH: f32 = 576.0;
const PDF_HEIGHT: f32 = 432.0;

// Plot area as fractions of the page, measured from the bottom-left corner
const AREA_LEFT: f32 = 0.12;
const AREA_RIGHT: f32 = 0.96;
const AREA_BOTTOM: f32 = 0.13;
const AREA_TOP: f32 = 0.90;

const PRECISION_COLOR: [u8; 3] = [214, 39, 40];
const RECALL_COLOR: [u8; 3] = [31, 119, 180];
const THRESHOLD_COLOR: [u8; 3] = [40, 40, 40];
const GRID_COLOR: [u8; 3] = [225, 225, 225];
const AXIS_COLOR: [u8; 3] = [0, 0, 0];

/// `PR_<scene>_@d_th_0_<threshold * 10000, 4 digits>`
pub fn plot_file_stem(scene: &str, threshold: f32) -> String {
    let scaled = (threshold as f64 * 10000.0).round() as i64;
    format!("PR_{}_@d_th_0_{:04}", scene, scaled)
}

/// Map a distance in `[0, threshold]` and beyond to a `hot_r` color:
/// white at zero, through yellow and red, to black at `max_distance`.
pub fn hot_r(distance: f32, max_distance: f32) -> [u8; 3] {
    let t = if max_distance > 0.0 {
        (distance / max_distance).clamp(0.0, 1.0)
    } else {
        1.0
    };
    let v = 1.0 - t;
    let r = (v / 0.365).clamp(0.0, 1.0);
    let g = ((v - 0.365) / 0.365).clamp(0.0, 1.0);
    let b = ((v - 0.73) / 0.27).clamp(0.0, 1.0);
    [
        (r * 255.0).round() as u8,
        (g * 255.0).round() as u8,
        (b * 255.0).round() as u8,
    ]
}

/// Per-point colors for a distance set
pub fn distance_colors(distances: &[f32], max_distance: f32) -> Vec<[u8; 3]> {
    distances.iter().map(|d| hot_r(*d, max_distance)).collect()
}

/// One precision/recall figure
pub struct PrecisionRecallPlot<'a> {
    pub scene: &'a str,
    pub scores: &'a PrecisionRecall,
    pub plot_stretch: f32,
}

impl<'a> PrecisionRecallPlot<'a> {
    pub fn new(scene: &'a str, scores: &'a PrecisionRecall, plot_stretch: f32) -> Self {
        Self {
            scene,
            scores,
            plot_stretch,
        }
    }

    fn x_max(&self) -> f32 {
        (self.scores.threshold * self.plot_stretch).max(f32::EPSILON)
    }

    /// Data point (distance, percent) to fractions of the plot area
    fn normalize(&self, x: f32, percent: f32) -> (f32, f32) {
        (
            (x / self.x_max()).clamp(0.0, 1.0),
            (percent / 100.0).clamp(0.0, 1.0),
        )
    }

    fn curve(&self, bins: &[(f32, f32)]) -> Vec<(f32, f32)> {
        bins.iter()
            .map(|(edge, fraction)| self.normalize(*edge, fraction * 100.0))
            .collect()
    }

    fn title(&self) -> String {
        format!(
            "Precision and Recall: {}, {:.2}%",
            self.scene,
            self.scores.fscore * 100.0
        )
    }

    /// Write `<stem>.png` and `<stem>.pdf` into `dir`
    pub fn write_all(&self, dir: &Path) -> Result<(PathBuf, PathBuf)> {
        let stem = plot_file_stem(self.scene, self.scores.threshold);
        let png = dir.join(format!("{}.png", stem));
        let pdf = dir.join(format!("{}.pdf", stem));
        self.write_png(&png)?;
        self.write_pdf(&pdf)?;
        Ok((png, pdf))
    }

    pub fn write_png(&self, path: &Path) -> Result<()> {
        let mut canvas = Canvas::new(PNG_WIDTH, PNG_HEIGHT);

        for k in 0..=10 {
            let f = k as f32 / 10.0;
            canvas.line((f, 0.0), (f, 1.0), GRID_COLOR, 1, None);
            canvas.line((0.0, f), (1.0, f), GRID_COLOR, 1, None);
        }

        let threshold_x = self.normalize(self.scores.threshold, 0.0).0;
        canvas.line(
            (threshold_x, 0.0),
            (threshold_x, 1.0),
            THRESHOLD_COLOR,
            2,
            Some(8),
        );

        for (bins, color) in [
            (&self.scores.precision_histogram.bins, PRECISION_COLOR),
            (&self.scores.recall_histogram.bins, RECALL_COLOR),
        ] {
            let curve = self.curve(bins);
            for pair in curve.windows(2) {
                canvas.line(pair[0], pair[1], color, 3, None);
            }
        }

        canvas.line((0.0, 0.0), (1.0, 0.0), AXIS_COLOR, 2, None);
        canvas.line((0.0, 0.0), (0.0, 1.0), AXIS_COLOR, 2, None);

        canvas
            .image
            .save(path)
            .with_context(|| format!("Failed to save plot to {}", path.display()))
    }

    pub fn write_pdf(&self, path: &Path) -> Result<()> {
        let mut page = PdfPage::new(PDF_WIDTH, PDF_HEIGHT);

        page.stroke_color(GRID_COLOR);
        page.line_width(0.5);
        for k in 0..=10 {
            let f = k as f32 / 10.0;
            page.segment((f, 0.0), (f, 1.0));
            page.segment((0.0, f), (1.0, f));
        }

        page.stroke_color(THRESHOLD_COLOR);
        page.line_width(1.0);
        page.dash(Some((4.0, 3.0)));
        let threshold_x = self.normalize(self.scores.threshold, 0.0).0;
        page.segment((threshold_x, 0.0), (threshold_x, 1.0));
        page.dash(None);

        page.line_width(1.5);
        page.stroke_color(PRECISION_COLOR);
        page.polyline(&self.curve(&self.scores.precision_histogram.bins));
        page.stroke_color(RECALL_COLOR);
        page.polyline(&self.curve(&self.scores.recall_histogram.bins));

        page.stroke_color(AXIS_COLOR);
        page.line_width(1.0);
        page.segment((0.0, 0.0), (1.0, 0.0));
        page.segment((0.0, 0.0), (0.0, 1.0));

        // Ticks
        let x_max = self.x_max();
        for k in 0..=5 {
            let f = k as f32 / 5.0;
            page.text_at_area(f, 0.0, 0.0, -14.0, 9.0, &format!("{:.3}", x_max * f), true);
            page.text_at_area(0.0, f, -26.0, -3.0, 9.0, &format!("{}", k * 20), false);
        }

        page.text_at(PDF_WIDTH / 2.0, 14.0, 11.0, "Meters", true);
        page.text_rotated(16.0, PDF_HEIGHT / 2.0, 11.0, "# of points (%)");
        page.text_at(PDF_WIDTH / 2.0, PDF_HEIGHT - 28.0, 13.0, &self.title(), true);

        // Legend, lower right of the plot area
        let entries = [
            ("Precision", PRECISION_COLOR, false),
            ("Recall", RECALL_COLOR, false),
            ("Threshold", THRESHOLD_COLOR, true),
        ];
        for (row, (label, color, dashed)) in entries.iter().enumerate() {
            let fy = 0.08 + 0.07 * (entries.len() - 1 - row) as f32;
            page.stroke_color(*color);
            page.line_width(1.5);
            page.dash(if *dashed { Some((4.0, 3.0)) } else { None });
            page.segment((0.72, fy), (0.79, fy));
            page.dash(None);
            page.text_at_area(0.81, fy, 0.0, -3.0, 9.0, label, false);
        }

        std::fs::write(path, page.finish())
            .with_context(|| format!("Failed to save plot to {}", path.display()))
    }
}

/// Raster target with plot-area coordinates
struct Canvas {
    image: RgbImage,
}

impl Canvas {
    fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbImage::from_pixel(width, height, Rgb([255, 255, 255])),
        }
    }

    fn to_pixel(&self, (fx, fy): (f32, f32)) -> (f32, f32) {
        let w = self.image.width() as f32;
        let h = self.image.height() as f32;
        let x = (AREA_LEFT + fx * (AREA_RIGHT - AREA_LEFT)) * w;
        let y = (1.0 - (AREA_BOTTOM + fy * (AREA_TOP - AREA_BOTTOM))) * h;
        (x, y)
    }

    fn stamp(&mut self, x: f32, y: f32, color: [u8; 3], thickness: i32) {
        let r = thickness / 2;
        let cx = x.round() as i32;
        let cy = y.round() as i32;
        for dy in -r..(thickness - r) {
            for dx in -r..(thickness - r) {
                let px = cx + dx;
                let py = cy + dy;
                if px >= 0
                    && py >= 0
                    && (px as u32) < self.image.width()
                    && (py as u32) < self.image.height()
                {
                    self.image.put_pixel(px as u32, py as u32, Rgb(color));
                }
            }
        }
    }

    /// Straight line between two plot-area points; `dash` is the dash
    /// length in pixels
    fn line(
        &mut self,
        a: (f32, f32),
        b: (f32, f32),
        color: [u8; 3],
        thickness: i32,
        dash: Option<usize>,
    ) {
        let (x0, y0) = self.to_pixel(a);
        let (x1, y1) = self.to_pixel(b);
        let steps = (x1 - x0).abs().max((y1 - y0).abs()).ceil().max(1.0) as usize;

        for i in 0..=steps {
            if let Some(len) = dash {
                if (i / len) % 2 == 1 {
                    continue;
                }
            }
            let t = i as f32 / steps as f32;
            self.stamp(x0 + (x1 - x0) * t, y0 + (y1 - y0) * t, color, thickness);
        }
    }
}

/// Single-page PDF built from raw content-stream operators
struct PdfPage {
    width: f32,
    height: f32,
    ops: String,
}

impl PdfPage {
    fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            ops: String::new(),
        }
    }

    fn to_page(&self, (fx, fy): (f32, f32)) -> (f32, f32) {
        (
            (AREA_LEFT + fx * (AREA_RIGHT - AREA_LEFT)) * self.width,
            (AREA_BOTTOM + fy * (AREA_TOP - AREA_BOTTOM)) * self.height,
        )
    }

    fn stroke_color(&mut self, [r, g, b]: [u8; 3]) {
        let _ = writeln!(
            self.ops,
            "{:.3} {:.3} {:.3} RG",
            r as f32 / 255.0,
            g as f32 / 255.0,
            b as f32 / 255.0
        );
    }

    fn line_width(&mut self, width: f32) {
        let _ = writeln!(self.ops, "{:.2} w", width);
    }

    fn dash(&mut self, pattern: Option<(f32, f32)>) {
        match pattern {
            Some((on, off)) => {
                let _ = writeln!(self.ops, "[{:.1} {:.1}] 0 d", on, off);
            }
            None => self.ops.push_str("[] 0 d\n"),
        }
    }

    fn segment(&mut self, a: (f32, f32), b: (f32, f32)) {
        self.polyline(&[a, b]);
    }

    fn polyline(&mut self, points: &[(f32, f32)]) {
        if points.len() < 2 {
            return;
        }
        for (i, p) in points.iter().enumerate() {
            let (x, y) = self.to_page(*p);
            let op = if i == 0 { "m" } else { "l" };
            let _ = writeln!(self.ops, "{:.2} {:.2} {}", x, y, op);
        }
        self.ops.push_str("S\n");
    }

    fn text_at(&mut self, x: f32, y: f32, size: f32, text: &str, centered: bool) {
        // Helvetica averages roughly half an em per glyph
        let x = if centered {
            x - text.chars().count() as f32 * size * 0.25
        } else {
            x
        };
        let _ = writeln!(
            self.ops,
            "BT /F1 {:.1} Tf {:.2} {:.2} Td ({}) Tj ET",
            size,
            x,
            y,
            escape(text)
        );
    }

    /// Text anchored to a plot-area point, shifted by `(dx, dy)` page units
    #[allow(clippy::too_many_arguments)]
    fn text_at_area(
        &mut self,
        fx: f32,
        fy: f32,
        dx: f32,
        dy: f32,
        size: f32,
        text: &str,
        centered: bool,
    ) {
        let (x, y) = self.to_page((fx, fy));
        self.text_at(x + dx, y + dy, size, text, centered);
    }

    fn text_rotated(&mut self, x: f32, y: f32, size: f32, text: &str) {
        let y = y - text.chars().count() as f32 * size * 0.25;
        let _ = writeln!(
            self.ops,
            "BT /F1 {:.1} Tf 0 1 -1 0 {:.2} {:.2} Tm ({}) Tj ET",
            size,
            x,
            y,
            escape(text)
        );
    }

    fn finish(self) -> Vec<u8> {
        let objects = [
            "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
            "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
            format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {:.0} {:.0}] \
                 /Resources << /Font << /F1 5 0 R >> >> /Contents 4 0 R >>",
                self.width, self.height
            ),
            format!(
                "<< /Length {} >>\nstream\n{}endstream",
                self.ops.len(),
                self.ops
            ),
            "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string(),
        ];

        let mut out = String::from("%PDF-1.4\n");
        let mut offsets = Vec::with_capacity(objects.len());
        for (i, body) in objects.iter().enumerate() {
            offsets.push(out.len());
            let _ = write!(out, "{} 0 obj\n{}\nendobj\n", i + 1, body);
        }

        let xref = out.len();
        let _ = write!(out, "xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
        for offset in offsets {
            let _ = writeln!(out, "{:010} 00000 n ", offset);
        }
        let _ = write!(
            out,
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            objects.len() + 1,
            xref
        );

        out.into_bytes()
    }
}

/// PDF literal string escaping; non-ASCII becomes `?`
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' | '(' | ')' => {
                out.push('\\');
                out.push(c);
            }
            c if c.is_ascii() && !c.is_ascii_control() => out.push(c),
            _ => out.push('?'),
        }
    }
    out
}
