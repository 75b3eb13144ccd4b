//! PNG rendering of the BAC risk dashboard.
//!
//! The chart shows the decay curve colored by risk band, shaded risk zones,
//! dashed threshold lines, peak and time-to-legal markers, and a
//! safe-driving strip below the time axis.

use std::collections::{HashMap, HashSet};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use image::{DynamicImage, ImageFormat, RgbImage};
use once_cell::sync::Lazy;
use plotters::coord::types::RangedCoordf64;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::register_font;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::FontStyle;

use crate::config::ChartConfig;
use crate::curve::{hours_to_legal, sample_decay_curve, DecayCurve, DISPLAY_DECAY_RATE};
use crate::risk::{RiskBand, DANGER_THRESHOLD, HIGH_RISK_LINE, LEGAL_LIMIT, RED_ZONE_TOP};
use crate::{Error, Result};

pub const CHART_TITLE: &str = "Estimated BAC Over Time with Risk Dashboard";

/// Y position of the safe-driving strip
pub const DRIVING_BAR_LEVEL: f64 = -0.05;

/// Smallest upper bound of the BAC axis
pub const MIN_BAC_AXIS: f64 = 0.35;

/// Time axis length used when the horizon is zero
const MIN_TIME_AXIS: f64 = 0.1;

const FONT_FAMILY: &str = "sans-serif";

/// Locations probed for a label font when none is configured
const FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu-sans-fonts/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/truetype/freefont/FreeSans.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Leading tags of TrueType, OpenType and font collection files
const SFNT_SIGNATURES: [[u8; 4]; 4] = [[0, 1, 0, 0], *b"true", *b"OTTO", *b"ttcf"];

static LABEL_FONTS: Lazy<Mutex<FontRegistry>> =
    Lazy::new(|| Mutex::new(FontRegistry::default()));

type Dashboard<'a, 'b> =
    ChartContext<'a, BitMapBackend<'b>, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

struct ChartStyle;

impl ChartStyle {
    const MARGIN: i32 = 10;
    const CAPTION_FONT_SIZE: i32 = 18;
    const LABEL_FONT_SIZE: i32 = 13;
    const X_LABEL_AREA_SIZE: u32 = 35;
    const Y_LABEL_AREA_SIZE: u32 = 50;
    const X_LABEL_COUNT: usize = 6;
    const Y_LABEL_COUNT: usize = 6;
    const BACKGROUND: RGBColor = WHITE;
    const CURVE_WIDTH: u32 = 3;
    const BAR_WIDTH: u32 = 6;
    const ZONE_ALPHA: f64 = 0.2;
    const DASH_PERIODS: usize = 40;
    const DASH_FILL: f64 = 0.6;
    const LEGAL_COLOR: RGBColor = RGBColor(255, 165, 0);
    const HIGH_RISK_COLOR: RGBColor = RGBColor(139, 0, 0);
    const MARKER: RGBColor = RGBColor(255, 0, 0);
    const CAR: RGBColor = RGBColor(30, 80, 200);
    const WARNING: RGBColor = RGBColor(255, 165, 0);

    fn band(band: RiskBand) -> RGBColor {
        match band {
            RiskBand::Green => RGBColor(0, 128, 0),
            RiskBand::Yellow => RGBColor(255, 255, 0),
            RiskBand::Red => RGBColor(255, 0, 0),
        }
    }

    fn label(color: RGBColor, h: HPos, v: VPos) -> TextStyle<'static> {
        (FONT_FAMILY, Self::LABEL_FONT_SIZE)
            .into_font()
            .color(&color)
            .pos(Pos::new(h, v))
    }
}

/// Numbers the dashboard is drawn from
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChartRequest {
    pub current_bac: f64,
    pub peak_bac: f64,
    pub time_to_zero: f64,
    /// Slope of the plotted curve, percent BAC per hour
    pub decay_rate: f64,
}

impl ChartRequest {
    fn check_finite(&self) -> Result<()> {
        let fields = [
            ("current_bac", self.current_bac),
            ("peak_bac", self.peak_bac),
            ("time_to_zero", self.time_to_zero),
            ("decay_rate", self.decay_rate),
        ];
        match fields.iter().find(|(_, value)| !value.is_finite()) {
            Some((name, value)) => Err(Error::Render(format!(
                "cannot chart non-finite {} ({})",
                name, value
            ))),
            None => Ok(()),
        }
    }
}

/// Render with the fixed display slope and default chart settings
pub fn render(current_bac: f64, peak_bac: f64, time_to_zero: f64) -> Result<Vec<u8>> {
    let request = ChartRequest {
        current_bac,
        peak_bac,
        time_to_zero,
        decay_rate: DISPLAY_DECAY_RATE,
    };
    render_chart_png(&request, &ChartConfig::default())
}

/// Render the dashboard and encode it as PNG bytes
pub fn render_chart_png(request: &ChartRequest, config: &ChartConfig) -> Result<Vec<u8>> {
    request.check_finite()?;

    let curve = if request.time_to_zero < 0.0 {
        tracing::warn!(
            "Negative time horizon {}, drawing an empty curve",
            request.time_to_zero
        );
        DecayCurve::default()
    } else {
        sample_decay_curve(
            request.current_bac,
            request.time_to_zero,
            request.decay_rate,
            config.samples,
        )
    };
    let with_text = label_font_available(config.font_path.as_deref());

    let width = config.width;
    let height = config.height;
    let mut rgb_buffer = vec![255u8; width as usize * height as usize * 3];

    {
        let root =
            BitMapBackend::with_buffer(&mut rgb_buffer, (width, height)).into_drawing_area();
        root.fill(&ChartStyle::BACKGROUND)
            .map_err(backend_error("background fill"))?;

        draw_dashboard(&root, request, &curve, with_text)?;

        root.present().map_err(backend_error("present"))?;
    }

    let rgb_image = RgbImage::from_raw(width, height, rgb_buffer)
        .ok_or_else(|| Error::Render("image buffer conversion failed".to_string()))?;
    let mut output = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(rgb_image).write_to(&mut output, ImageFormat::Png)?;

    tracing::debug!(
        "Rendered {}x{} chart from {} samples",
        width,
        height,
        curve.len()
    );
    Ok(output.into_inner())
}

fn backend_error<E: std::fmt::Debug>(stage: &'static str) -> impl FnOnce(E) -> Error {
    move |error| Error::Render(format!("{} error: {:?}", stage, error))
}

fn draw_dashboard(
    root: &DrawingArea<BitMapBackend<'_>, Shift>,
    request: &ChartRequest,
    curve: &DecayCurve,
    with_text: bool,
) -> Result<()> {
    let x_end = if request.time_to_zero > 0.0 {
        request.time_to_zero
    } else {
        MIN_TIME_AXIS
    };
    let y_min = DRIVING_BAR_LEVEL - 0.02;
    let y_max = curve.max_bac().max(MIN_BAC_AXIS);

    let mut builder = ChartBuilder::on(root);
    builder.margin(ChartStyle::MARGIN);
    if with_text {
        builder
            .caption(CHART_TITLE, (FONT_FAMILY, ChartStyle::CAPTION_FONT_SIZE))
            .x_label_area_size(ChartStyle::X_LABEL_AREA_SIZE)
            .y_label_area_size(ChartStyle::Y_LABEL_AREA_SIZE);
    }
    let mut chart = builder
        .build_cartesian_2d(0.0..x_end, y_min..y_max)
        .map_err(backend_error("chart build"))?;

    if with_text {
        chart
            .configure_mesh()
            .x_labels(ChartStyle::X_LABEL_COUNT)
            .y_labels(ChartStyle::Y_LABEL_COUNT)
            .y_label_formatter(&|value| format!("{:.2}", value))
            .x_desc("Hours")
            .y_desc("BAC (%)")
            .draw()
            .map_err(backend_error("mesh draw"))?;
    }

    draw_risk_zones(&mut chart, x_end)?;
    draw_curve(&mut chart, curve)?;
    let thresholds = [
        (LEGAL_LIMIT, "Legal Limit", ChartStyle::LEGAL_COLOR),
        (HIGH_RISK_LINE, "High Risk", ChartStyle::HIGH_RISK_COLOR),
    ];
    for (level, label, color) in thresholds {
        draw_threshold(&mut chart, level, label, color, x_end, with_text)?;
    }
    draw_markers(&mut chart, request)?;
    draw_driving_bar(&mut chart, curve)?;

    Ok(())
}

fn draw_risk_zones(chart: &mut Dashboard<'_, '_>, x_end: f64) -> Result<()> {
    let zones = [
        (LEGAL_LIMIT, DANGER_THRESHOLD, RiskBand::Yellow),
        (DANGER_THRESHOLD, RED_ZONE_TOP, RiskBand::Red),
    ];
    chart
        .draw_series(zones.iter().map(|&(low, high, band)| {
            Rectangle::new(
                [(0.0, low), (x_end, high)],
                ChartStyle::band(band).mix(ChartStyle::ZONE_ALPHA).filled(),
            )
        }))
        .map_err(backend_error("risk zone draw"))?;
    Ok(())
}

fn draw_curve(chart: &mut Dashboard<'_, '_>, curve: &DecayCurve) -> Result<()> {
    chart
        .draw_series(curve.segments().map(|(start, end, band)| {
            PathElement::new(
                vec![(start.hours, start.bac), (end.hours, end.bac)],
                ChartStyle::band(band).stroke_width(ChartStyle::CURVE_WIDTH),
            )
        }))
        .map_err(backend_error("curve draw"))?;
    Ok(())
}

fn draw_threshold(
    chart: &mut Dashboard<'_, '_>,
    level: f64,
    label: &str,
    color: RGBColor,
    x_end: f64,
    with_text: bool,
) -> Result<()> {
    let period = x_end / ChartStyle::DASH_PERIODS as f64;
    chart
        .draw_series((0..ChartStyle::DASH_PERIODS).map(|i| {
            let start = i as f64 * period;
            PathElement::new(
                vec![(start, level), (start + period * ChartStyle::DASH_FILL, level)],
                color.stroke_width(1),
            )
        }))
        .map_err(backend_error("threshold draw"))?;

    if with_text {
        chart
            .draw_series(std::iter::once(Text::new(
                label.to_string(),
                (x_end * 0.95, level),
                ChartStyle::label(color, HPos::Right, VPos::Bottom),
            )))
            .map_err(backend_error("threshold label draw"))?;
    }
    Ok(())
}

fn draw_markers(chart: &mut Dashboard<'_, '_>, request: &ChartRequest) -> Result<()> {
    if request.peak_bac >= LEGAL_LIMIT {
        chart
            .draw_series(std::iter::once(
                EmptyElement::at((0.5 * request.time_to_zero, request.peak_bac))
                    + TriangleMarker::new((0, -8), 8, ChartStyle::WARNING.filled())
                    + TriangleMarker::new((0, -8), 8, BLACK.stroke_width(1)),
            ))
            .map_err(backend_error("peak marker draw"))?;
    }

    if request.current_bac > LEGAL_LIMIT {
        if let Some(time_to_legal) = hours_to_legal(request.current_bac, request.decay_rate) {
            let at = (time_to_legal, LEGAL_LIMIT);
            chart
                .draw_series(std::iter::once(Circle::new(
                    at,
                    4,
                    ChartStyle::MARKER.filled(),
                )))
                .map_err(backend_error("legal marker draw"))?;
            draw_car(chart, at, -10)?;
        }
    }
    Ok(())
}

fn draw_driving_bar(chart: &mut Dashboard<'_, '_>, curve: &DecayCurve) -> Result<()> {
    chart
        .draw_series(curve.segments().map(|(start, end, band)| {
            PathElement::new(
                vec![
                    (start.hours, DRIVING_BAR_LEVEL),
                    (end.hours, DRIVING_BAR_LEVEL),
                ],
                ChartStyle::band(band).stroke_width(ChartStyle::BAR_WIDTH),
            )
        }))
        .map_err(backend_error("driving bar draw"))?;

    draw_car(chart, (0.0, DRIVING_BAR_LEVEL), 0)?;

    if let Some(stop) = curve.first_over_limit() {
        chart
            .draw_series(std::iter::once(Cross::new(
                (stop.hours, DRIVING_BAR_LEVEL),
                6,
                ChartStyle::MARKER.stroke_width(3),
            )))
            .map_err(backend_error("stop marker draw"))?;
    }
    Ok(())
}

/// Small car glyph centered `lift` pixels below `at`
fn draw_car(chart: &mut Dashboard<'_, '_>, at: (f64, f64), lift: i32) -> Result<()> {
    let body = ChartStyle::CAR.filled();
    chart
        .draw_series(std::iter::once(
            EmptyElement::at(at)
                + Rectangle::new([(-7, lift - 2), (7, lift + 3)], body)
                + Rectangle::new([(-4, lift - 6), (4, lift - 2)], body),
        ))
        .map_err(backend_error("car icon draw"))?;
    Ok(())
}

/// Font files registered with plotters, keyed by the configured preference
#[derive(Default)]
struct FontRegistry {
    /// Font chosen for each `font_path` setting, `None` when nothing loaded
    resolved: HashMap<Option<PathBuf>, Option<PathBuf>>,
    /// Font data handed to plotters, which keeps it for the life of the process
    loaded: HashMap<PathBuf, &'static [u8]>,
    rejected: HashSet<PathBuf>,
    active: Option<PathBuf>,
}

impl FontRegistry {
    /// Make the font for `preferred` the active label font
    ///
    /// Returns whether text can be drawn. Probing happens once per distinct
    /// preference; switching back to an earlier one re-registers its font.
    fn select(&mut self, preferred: Option<&Path>) -> bool {
        let key = preferred.map(Path::to_path_buf);
        let chosen = match self.resolved.get(&key) {
            Some(chosen) => chosen.clone(),
            None => {
                let chosen = self.probe(preferred);
                if chosen.is_none() {
                    tracing::warn!("No TrueType font found, chart text will be omitted");
                }
                self.resolved.insert(key, chosen.clone());
                chosen
            }
        };

        match chosen {
            Some(path) => self.activate(&path),
            None => false,
        }
    }

    fn probe(&mut self, preferred: Option<&Path>) -> Option<PathBuf> {
        let candidates = preferred
            .map(Path::to_path_buf)
            .into_iter()
            .chain(FONT_CANDIDATES.iter().map(PathBuf::from));

        for path in candidates {
            if self.activate(&path) {
                return Some(path);
            }
        }
        None
    }

    fn activate(&mut self, path: &Path) -> bool {
        if self.active.as_deref() == Some(path) {
            return true;
        }
        if self.rejected.contains(path) {
            return false;
        }

        let bytes = match self.loaded.get(path) {
            Some(bytes) => *bytes,
            None => match load_font_file(path) {
                Some(bytes) => bytes,
                None => {
                    self.rejected.insert(path.to_path_buf());
                    return false;
                }
            },
        };

        match register_font(FONT_FAMILY, FontStyle::Normal, bytes) {
            Ok(()) => {
                tracing::debug!("Using chart font {:?}", path);
                self.loaded.insert(path.to_path_buf(), bytes);
                self.active = Some(path.to_path_buf());
                true
            }
            Err(_error) => {
                tracing::warn!("Unusable font at {:?}: invalid font data", path);
                self.rejected.insert(path.to_path_buf());
                false
            }
        }
    }
}

/// Register the label font for this chart config
fn label_font_available(preferred: Option<&Path>) -> bool {
    let mut registry = match LABEL_FONTS.lock() {
        Ok(registry) => registry,
        Err(poisoned) => poisoned.into_inner(),
    };
    registry.select(preferred)
}

/// Read a font file, keeping only data that starts like a TrueType/OpenType font
fn load_font_file(path: &Path) -> Option<&'static [u8]> {
    let bytes = std::fs::read(path).ok()?;
    if !has_sfnt_signature(&bytes) {
        tracing::debug!("Skipping {:?}, not a TrueType or OpenType file", path);
        return None;
    }
    Some(Box::leak(bytes.into_boxed_slice()))
}

fn has_sfnt_signature(bytes: &[u8]) -> bool {
    bytes
        .get(..4)
        .map_or(false, |tag| SFNT_SIGNATURES.iter().any(|sig| sig == tag))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(png: &[u8]) -> RgbImage {
        image::load_from_memory(png).unwrap().to_rgb8()
    }

    fn count_pixels(image: &RgbImage, matches: impl Fn(u8, u8, u8) -> bool) -> usize {
        image
            .pixels()
            .filter(|p| matches(p.0[0], p.0[1], p.0[2]))
            .count()
    }

    fn near(pixel: &image::Rgb<u8>, color: RGBColor, tolerance: u8) -> bool {
        let RGBColor(r, g, b) = color;
        [r, g, b]
            .iter()
            .zip(pixel.0.iter())
            .all(|(want, got)| want.abs_diff(*got) <= tolerance)
    }

    fn count_color(image: &RgbImage, color: RGBColor, tolerance: u8) -> usize {
        image.pixels().filter(|p| near(p, color, tolerance)).count()
    }

    fn count_in_rows(
        image: &RgbImage,
        rows: std::ops::RangeInclusive<u32>,
        color: RGBColor,
    ) -> usize {
        rows.filter(|&y| y < image.height())
            .flat_map(|y| (0..image.width()).map(move |x| (x, y)))
            .filter(|&(x, y)| near(image.get_pixel(x, y), color, 0))
            .count()
    }

    fn row_xs(image: &RgbImage, y: u32, color: RGBColor) -> Vec<u32> {
        (0..image.width())
            .filter(|&x| near(image.get_pixel(x, y), color, 0))
            .collect()
    }

    /// Row holding the most pixels of `color`, with that count
    fn densest_row(image: &RgbImage, color: RGBColor) -> (u32, usize) {
        (0..image.height())
            .map(|y| (y, row_xs(image, y, color).len()))
            .max_by_key(|&(_, count)| count)
            .unwrap()
    }

    /// Number of separate runs of `color` along one row
    fn runs_in_row(image: &RgbImage, y: u32, color: RGBColor) -> usize {
        let xs = row_xs(image, y, color);
        xs.iter()
            .enumerate()
            .filter(|&(i, &x)| i == 0 || xs[i - 1] + 1 != x)
            .count()
    }

    fn mean(values: &[u32]) -> f64 {
        values.iter().map(|&v| v as f64).sum::<f64>() / values.len() as f64
    }

    #[test]
    fn test_renders_png_of_configured_size() {
        let png = render(0.12, 0.15, 8.0).unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");

        let image = decode(&png);
        assert_eq!(image.dimensions(), (600, 300));
    }

    #[test]
    fn test_custom_size() {
        let config = ChartConfig {
            width: 400,
            height: 240,
            ..ChartConfig::default()
        };
        let request = ChartRequest {
            current_bac: 0.1,
            peak_bac: 0.1,
            time_to_zero: 5.0,
            decay_rate: 0.02,
        };
        let image = decode(&render_chart_png(&request, &config).unwrap());
        assert_eq!(image.dimensions(), (400, 240));
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let first = render(0.25, 0.3, 16.0).unwrap();
        let second = render(0.25, 0.3, 16.0).unwrap();
        assert_eq!(decode(&first).into_raw(), decode(&second).into_raw());
    }

    #[test]
    fn test_low_bac_has_no_red_curve() {
        let image = decode(&render(0.05, 0.05, 3.0).unwrap());
        let greenish = count_pixels(&image, |r, g, b| {
            g > r.saturating_add(60) && g > b.saturating_add(60)
        });
        let saturated_red = count_pixels(&image, |r, g, b| r > 200 && g < 60 && b < 60);
        assert!(greenish > 0);
        assert_eq!(saturated_red, 0);
    }

    #[test]
    fn test_high_bac_draws_red_segments() {
        let image = decode(&render(0.3, 0.3, 20.0).unwrap());
        let saturated_red = count_pixels(&image, |r, g, b| r > 200 && g < 60 && b < 60);
        assert!(saturated_red > 0);
    }

    #[test]
    fn test_zero_horizon_still_renders() {
        let image = decode(&render(0.0, 0.0, 0.0).unwrap());
        assert_eq!(image.dimensions(), (600, 300));
    }

    #[test]
    fn test_negative_horizon_renders_empty_curve() {
        let png = render(0.1, 0.1, -2.0).unwrap();
        assert!(!png.is_empty());
    }

    #[test]
    fn test_rejects_non_finite_values() {
        let result = render(f64::INFINITY, f64::INFINITY, 1.0);
        assert!(matches!(result, Err(Error::Render(_))));
    }

    #[test]
    fn test_flat_curve_with_zero_decay() {
        let request = ChartRequest {
            current_bac: 0.1,
            peak_bac: 0.1,
            time_to_zero: 0.1,
            decay_rate: 0.0,
        };
        assert!(render_chart_png(&request, &ChartConfig::default()).is_ok());
    }

    #[test]
    fn test_risk_zones_are_shaded() {
        let image = decode(&render(0.05, 0.05, 3.0).unwrap());
        let yellow_zone = count_color(&image, RGBColor(255, 255, 204), 3);
        let red_zone = count_color(&image, RGBColor(255, 204, 204), 3);
        assert!(yellow_zone > 2000, "yellow zone pixels: {}", yellow_zone);
        assert!(red_zone > 2000, "red zone pixels: {}", red_zone);
    }

    #[test]
    fn test_threshold_lines_are_dashed() {
        let image = decode(&render(0.05, 0.05, 3.0).unwrap());
        for color in [ChartStyle::LEGAL_COLOR, ChartStyle::HIGH_RISK_COLOR] {
            let (row, count) = densest_row(&image, color);
            assert!(count > 150, "{:?} line has {} pixels", color, count);
            let dashes = runs_in_row(&image, row, color);
            assert!(dashes >= 30, "{:?} line has {} dashes", color, dashes);
        }
    }

    #[test]
    fn test_peak_marker_drawn_from_legal_limit() {
        let without = decode(&render(0.15, 0.0, 10.0).unwrap()).into_raw();
        let high_peak = decode(&render(0.15, 0.25, 10.0).unwrap()).into_raw();
        let at_limit = decode(&render(0.15, LEGAL_LIMIT, 10.0).unwrap()).into_raw();
        let below_limit = decode(&render(0.15, 0.079, 10.0).unwrap()).into_raw();

        assert_ne!(high_peak, without);
        assert_ne!(at_limit, without);
        assert_eq!(below_limit, without);
    }

    #[test]
    fn test_legal_marker_only_over_limit() {
        let over = decode(&render(0.15, 0.15, 10.0).unwrap());
        let at_limit = decode(&render(LEGAL_LIMIT, LEGAL_LIMIT, 10.0).unwrap());

        let cars_over = count_color(&over, ChartStyle::CAR, 0);
        let cars_at_limit = count_color(&at_limit, ChartStyle::CAR, 0);
        assert!(cars_at_limit > 0);
        assert!(
            cars_over >= cars_at_limit + 40,
            "car pixels {} vs {}",
            cars_over,
            cars_at_limit
        );
    }

    #[test]
    fn test_no_legal_marker_without_decay() {
        let request = ChartRequest {
            current_bac: 0.15,
            peak_bac: 0.15,
            time_to_zero: 0.1,
            decay_rate: 0.0,
        };
        let image = decode(&render_chart_png(&request, &ChartConfig::default()).unwrap());
        let yellow = ChartStyle::band(RiskBand::Yellow);

        // lowest full-width yellow row is the bottom edge of the strip
        let strip_bottom = (0..image.height())
            .rev()
            .find(|&y| row_xs(&image, y, yellow).len() > 300)
            .unwrap();
        assert!(count_in_rows(&image, 0..=strip_bottom, ChartStyle::CAR) > 0);
        assert_eq!(
            count_in_rows(&image, 0..=strip_bottom - 16, ChartStyle::CAR),
            0
        );
    }

    #[test]
    fn test_driving_strip_below_axis() {
        let image = decode(&render(0.05, 0.05, 3.0).unwrap());
        let green = ChartStyle::band(RiskBand::Green);

        let (row, count) = densest_row(&image, green);
        assert!(count > 300, "strip row has {} green pixels", count);
        assert!(row > image.height() / 2);
        assert!(row_xs(&image, row, ChartStyle::band(RiskBand::Yellow)).is_empty());

        let near_strip = row.saturating_sub(10)..=row + 10;
        assert!(count_in_rows(&image, near_strip.clone(), ChartStyle::CAR) > 0);
        assert_eq!(count_in_rows(&image, near_strip, ChartStyle::MARKER), 0);
    }

    #[test]
    fn test_driving_strip_switches_band_with_stop_icon() {
        let image = decode(&render(0.15, 0.15, 10.0).unwrap());
        let green = ChartStyle::band(RiskBand::Green);
        let yellow = ChartStyle::band(RiskBand::Yellow);

        let (row, _) = densest_row(&image, green);
        let green_xs = row_xs(&image, row, green);
        let yellow_xs = row_xs(&image, row, yellow);
        assert!(green_xs.len() > 150, "green strip: {}", green_xs.len());
        assert!(yellow_xs.len() > 150, "yellow strip: {}", yellow_xs.len());
        assert!(mean(&yellow_xs) < mean(&green_xs));

        let near_strip = row.saturating_sub(8)..=row + 8;
        assert!(count_in_rows(&image, near_strip, ChartStyle::MARKER) > 0);
    }

    #[test]
    fn test_sfnt_signature() {
        assert!(has_sfnt_signature(&[0, 1, 0, 0, 0, 12]));
        assert!(has_sfnt_signature(b"OTTO\0\0"));
        assert!(has_sfnt_signature(b"ttcf"));
        assert!(!has_sfnt_signature(b"\x89PNG"));
        assert!(!has_sfnt_signature(b"tt"));
    }

    #[test]
    fn test_font_choice_is_kept_per_configured_path() {
        let dir = tempfile::tempdir().unwrap();
        let bogus = dir.path().join("notes.ttf");
        std::fs::write(&bogus, "not a font").unwrap();

        let mut registry = FontRegistry::default();
        registry.select(Some(bogus.as_path()));
        assert!(registry.rejected.contains(&bogus));
        assert!(!registry.loaded.contains_key(&bogus));
        assert_ne!(
            registry.resolved.get(&Some(bogus.clone())),
            Some(&Some(bogus.clone()))
        );

        let with_default = registry.select(None);
        assert_eq!(registry.resolved.len(), 2);
        assert_eq!(registry.select(Some(bogus.as_path())), with_default);
        assert_eq!(registry.resolved.len(), 2);
    }

    #[test]
    fn test_unusable_font_path_still_renders() {
        let dir = tempfile::tempdir().unwrap();
        let bogus = dir.path().join("broken.ttf");
        std::fs::write(&bogus, [0u8, 1, 0, 0, 7, 7]).unwrap();

        let config = ChartConfig {
            font_path: Some(bogus),
            ..ChartConfig::default()
        };
        let request = ChartRequest {
            current_bac: 0.12,
            peak_bac: 0.12,
            time_to_zero: 8.0,
            decay_rate: 0.015,
        };
        let image = decode(&render_chart_png(&request, &config).unwrap());
        assert_eq!(image.dimensions(), (600, 300));
    }
}
