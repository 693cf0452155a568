use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};
use plotters::coord::Shift;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;
use plotters_backend::{
    BackendColor, BackendCoord, BackendStyle, BackendTextStyle, DrawingErrorKind, text_anchor,
};

use crate::error::ChartError;

const LINE_COLOR: RGBColor = RGBColor(74, 144, 226);
const LABEL_FONT_SIZE: i32 = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartOptions {
    pub width: u32,
    pub height: u32,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            width: 900,
            height: 450,
        }
    }
}

/// Renders the balance series as a PNG line chart, month 1 on the left.
pub fn render_balance_chart(balances: &[f64], options: &ChartOptions) -> Result<Vec<u8>, ChartError> {
    let pixels = render_pixels(balances, options)?;
    let mut png = Vec::new();
    PngEncoder::new(&mut png).write_image(
        &pixels,
        options.width,
        options.height,
        ExtendedColorType::Rgb8,
    )?;
    Ok(png)
}

pub fn balance_chart_data_uri(balances: &[f64], options: &ChartOptions) -> Result<String, ChartError> {
    let png = render_balance_chart(balances, options)?;
    Ok(format!("data:image/png;base64,{}", STANDARD.encode(png)))
}

fn render_pixels(balances: &[f64], options: &ChartOptions) -> Result<Vec<u8>, ChartError> {
    if balances.is_empty() {
        return Err(ChartError::EmptySeries);
    }

    let mut pixels = vec![0u8; options.width as usize * options.height as usize * 3];
    {
        let backend = BitMapBackend::with_buffer(&mut pixels, (options.width, options.height));
        let root = GlyphTextBackend::new(backend).into_drawing_area();
        draw_balance_chart(root, balances).map_err(|e| ChartError::Drawing(e.to_string()))?;
    }
    Ok(pixels)
}

fn draw_balance_chart<DB>(
    root: DrawingArea<DB, Shift>,
    balances: &[f64],
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>>
where
    DB: DrawingBackend,
{
    root.fill(&WHITE)?;

    let x_max = balances.len().max(2) as f64;
    let y_min = balances.iter().copied().fold(0.0, f64::min);
    let mut y_max = balances.iter().copied().fold(f64::MIN, f64::max) * 1.05;
    if !y_max.is_finite() || y_max <= y_min {
        y_max = y_min + 1.0;
    }

    let mut chart = ChartBuilder::on(&root)
        .margin(20)
        .set_label_area_size(LabelAreaPosition::Left, 90)
        .set_label_area_size(LabelAreaPosition::Bottom, 60)
        .build_cartesian_2d(1.0..x_max, y_min..y_max)?;

    chart
        .configure_mesh()
        .light_line_style(&TRANSPARENT)
        .bold_line_style(&BLACK.mix(0.1))
        .x_desc("MONTH")
        .y_desc("BALANCE")
        .x_label_formatter(&|v| format!("{:.0}", v))
        .y_label_formatter(&|v| format_axis_amount(*v))
        .label_style(("sans-serif", LABEL_FONT_SIZE))
        .axis_desc_style(("sans-serif", LABEL_FONT_SIZE))
        .draw()?;

    chart.draw_series(LineSeries::new(
        balances
            .iter()
            .enumerate()
            .map(|(idx, balance)| ((idx + 1) as f64, *balance)),
        Color::stroke_width(&LINE_COLOR, 2),
    ))?;

    root.present()?;
    Ok(())
}

fn format_axis_amount(value: f64) -> String {
    let magnitude = value.abs();
    if magnitude >= 1_000_000.0 {
        format!("{:.1}M", value / 1_000_000.0)
    } else if magnitude >= 1_000.0 {
        format!("{:.0}K", value / 1_000.0)
    } else {
        format!("{:.0}", value)
    }
}

/// Wraps a backend and draws text from a built-in bitmap glyph set, so the
/// chart renders identically whether or not the host has any fonts.
struct GlyphTextBackend<DB> {
    inner: DB,
}

impl<DB> GlyphTextBackend<DB> {
    fn new(inner: DB) -> Self {
        Self { inner }
    }
}

impl<DB: DrawingBackend> DrawingBackend for GlyphTextBackend<DB> {
    type ErrorType = DB::ErrorType;

    fn get_size(&self) -> (u32, u32) {
        self.inner.get_size()
    }

    fn ensure_prepared(&mut self) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.ensure_prepared()
    }

    fn present(&mut self) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.present()
    }

    fn draw_pixel(
        &mut self,
        point: BackendCoord,
        color: BackendColor,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.draw_pixel(point, color)
    }

    fn draw_line<S: BackendStyle>(
        &mut self,
        from: BackendCoord,
        to: BackendCoord,
        style: &S,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.draw_line(from, to, style)
    }

    fn draw_rect<S: BackendStyle>(
        &mut self,
        upper_left: BackendCoord,
        bottom_right: BackendCoord,
        style: &S,
        fill: bool,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.draw_rect(upper_left, bottom_right, style, fill)
    }

    fn draw_path<S: BackendStyle, I: IntoIterator<Item = BackendCoord>>(
        &mut self,
        path: I,
        style: &S,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.draw_path(path, style)
    }

    fn fill_polygon<S: BackendStyle, I: IntoIterator<Item = BackendCoord>>(
        &mut self,
        vert: I,
        style: &S,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.fill_polygon(vert, style)
    }

    fn draw_text<TStyle: BackendTextStyle>(
        &mut self,
        text: &str,
        style: &TStyle,
        pos: BackendCoord,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        let color = style.color();
        if color.alpha == 0.0 || text.trim().is_empty() {
            return Ok(());
        }

        let ((_, min_y), (_, max_y)) = style
            .layout_box(text)
            .map_err(|e| DrawingErrorKind::FontError(Box::new(e)))?;
        let height = (max_y - min_y).max(1);
        let scale = ((height as f64 / GLYPH_HEIGHT as f64).round() as i32).max(1);
        let width: i32 = text
            .chars()
            .map(|ch| glyph(ch).map_or(SPACE_WIDTH, |g| g.width as i32 + 1) * scale)
            .sum();

        let dx = match style.anchor().h_pos {
            text_anchor::HPos::Left => 0,
            text_anchor::HPos::Right => -width,
            text_anchor::HPos::Center => -width / 2,
        };
        let dy = match style.anchor().v_pos {
            text_anchor::VPos::Top => 0,
            text_anchor::VPos::Center => -(GLYPH_HEIGHT as i32 * scale) / 2,
            text_anchor::VPos::Bottom => -(GLYPH_HEIGHT as i32 * scale),
        };

        let mut cursor_x = pos.0 + dx;
        let top = pos.1 + dy;
        for ch in text.chars() {
            let Some(shape) = glyph(ch) else {
                cursor_x += SPACE_WIDTH * scale;
                continue;
            };
            for (row, pattern) in shape.rows.iter().enumerate() {
                for col in 0..shape.width {
                    if pattern & (1 << (shape.width - 1 - col)) != 0 {
                        let x = cursor_x + col as i32 * scale;
                        let y = top + row as i32 * scale;
                        for px in 0..scale {
                            for py in 0..scale {
                                self.inner.draw_pixel((x + px, y + py), color)?;
                            }
                        }
                    }
                }
            }
            cursor_x += (shape.width as i32 + 1) * scale;
        }
        Ok(())
    }

    fn estimate_text_size<TStyle: BackendTextStyle>(
        &self,
        text: &str,
        style: &TStyle,
    ) -> Result<(u32, u32), DrawingErrorKind<Self::ErrorType>> {
        self.inner.estimate_text_size(text, style)
    }

    fn blit_bitmap(
        &mut self,
        pos: BackendCoord,
        (iw, ih): (u32, u32),
        src: &[u8],
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.blit_bitmap(pos, (iw, ih), src)
    }
}

const GLYPH_HEIGHT: usize = 7;
const SPACE_WIDTH: i32 = 4;

#[derive(Clone, Copy)]
struct Glyph {
    width: u8,
    rows: [u8; GLYPH_HEIGHT],
}

const fn g5(rows: [u8; GLYPH_HEIGHT]) -> Glyph {
    Glyph { width: 5, rows }
}

// Covers the axis labels: digits, amount suffixes and the axis titles.
fn glyph(ch: char) -> Option<Glyph> {
    Some(match ch.to_ascii_uppercase() {
        '0' => g5([0b01110, 0b10001, 0b10011, 0b10101, 0b11001, 0b10001, 0b01110]),
        '1' => g5([0b00100, 0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110]),
        '2' => g5([0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b01000, 0b11111]),
        '3' => g5([0b11111, 0b00010, 0b00100, 0b00010, 0b00001, 0b10001, 0b01110]),
        '4' => g5([0b00010, 0b00110, 0b01010, 0b10010, 0b11111, 0b00010, 0b00010]),
        '5' => g5([0b11111, 0b10000, 0b11110, 0b00001, 0b00001, 0b10001, 0b01110]),
        '6' => g5([0b00110, 0b01000, 0b10000, 0b11110, 0b10001, 0b10001, 0b01110]),
        '7' => g5([0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b01000, 0b01000]),
        '8' => g5([0b01110, 0b10001, 0b10001, 0b01110, 0b10001, 0b10001, 0b01110]),
        '9' => g5([0b01110, 0b10001, 0b10001, 0b01111, 0b00001, 0b00010, 0b01100]),
        'A' => g5([0b01110, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001]),
        'B' => g5([0b11110, 0b10001, 0b10001, 0b11110, 0b10001, 0b10001, 0b11110]),
        'C' => g5([0b01110, 0b10001, 0b10000, 0b10000, 0b10000, 0b10001, 0b01110]),
        'E' => g5([0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b11111]),
        'H' => g5([0b10001, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001]),
        'K' => g5([0b10001, 0b10010, 0b10100, 0b11000, 0b10100, 0b10010, 0b10001]),
        'L' => g5([0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b11111]),
        'M' => g5([0b10001, 0b11011, 0b10101, 0b10101, 0b10001, 0b10001, 0b10001]),
        'N' => g5([0b10001, 0b11001, 0b10101, 0b10011, 0b10001, 0b10001, 0b10001]),
        'O' => g5([0b01110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110]),
        'T' => g5([0b11111, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100]),
        '.' => Glyph {
            width: 2,
            rows: [0b00, 0b00, 0b00, 0b00, 0b00, 0b11, 0b11],
        },
        ',' => Glyph {
            width: 2,
            rows: [0b00, 0b00, 0b00, 0b00, 0b01, 0b01, 0b10],
        },
        '-' => Glyph {
            width: 3,
            rows: [0b000, 0b000, 0b000, 0b111, 0b000, 0b000, 0b000],
        },
        _ => return None,
    })
}
