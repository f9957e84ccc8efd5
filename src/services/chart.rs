use crate::config::RenderConfig;
use crate::error::AppError;
use crate::models::{MonthlyRecord, QuarterlyRecord};
use plotters::prelude::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};

/// One grouped bar chart: an income and an expense bar per category.
#[derive(Debug, Clone)]
pub struct GroupedBars {
    pub title: String,
    pub title_pt: f64,
    pub x_desc: String,
    pub categories: Vec<String>,
    pub income: Vec<Option<f64>>,
    pub expense: Vec<Option<f64>>,
}

pub struct ChartRenderer {
    config: RenderConfig,
}

impl ChartRenderer {
    /// Loads and registers the configured font. Fails if it is missing or unusable.
    pub fn new(config: RenderConfig) -> Result<Self, AppError> {
        register_report_font(&config)?;
        Ok(Self { config })
    }

    pub fn quarterly_bars(&self, quarterly: &[QuarterlyRecord]) -> GroupedBars {
        let labels = &self.config.labels;
        GroupedBars {
            title: labels.quarterly_title.clone(),
            title_pt: self.config.quarterly_title_pt,
            x_desc: labels.quarter_axis.clone(),
            categories: quarterly.iter().map(|q| q.quarter_label.clone()).collect(),
            income: quarterly.iter().map(|q| Some(q.income_sum)).collect(),
            expense: quarterly.iter().map(|q| Some(q.expense_sum)).collect(),
        }
    }

    pub fn monthly_bars(&self, monthly: &[MonthlyRecord]) -> GroupedBars {
        let labels = &self.config.labels;
        GroupedBars {
            title: labels.monthly_title.clone(),
            title_pt: self.config.monthly_title_pt,
            x_desc: labels.month_axis.clone(),
            categories: monthly.iter().map(|m| m.month_label.clone()).collect(),
            income: monthly.iter().map(|m| m.income).collect(),
            expense: monthly.iter().map(|m| m.expense).collect(),
        }
    }

    pub fn render_quarterly(&self, quarterly: &[QuarterlyRecord], path: &Path) -> Result<(), AppError> {
        self.draw(&self.quarterly_bars(quarterly), path)
    }

    pub fn render_monthly(&self, monthly: &[MonthlyRecord], path: &Path) -> Result<(), AppError> {
        self.draw(&self.monthly_bars(monthly), path)
    }

    pub fn draw(&self, bars: &GroupedBars, path: &Path) -> Result<(), AppError> {
        ensure_output_dir(path)?;
        if bars.categories.is_empty() {
            return Err(AppError::Render(format!("no data to chart for {}", path.display())));
        }

        let start = std::time::Instant::now();
        let cfg = &self.config;
        let family = cfg.font_family.as_str();
        let (width, height) = cfg.pixel_size();
        let n = bars.categories.len();
        let (y_min, y_max) = value_range(
            bars.income.iter().chain(bars.expense.iter()).flatten().copied(),
        );

        let root = BitMapBackend::new(path, (width, height)).into_drawing_area();
        root.fill(&WHITE).map_err(render_error)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(
                bars.title.as_str(),
                (family, cfg.px(bars.title_pt)).into_font().style(FontStyle::Bold),
            )
            .margin(cfg.px(10.0) as u32)
            .x_label_area_size(cfg.px(36.0) as u32)
            .y_label_area_size(cfg.px(64.0) as u32)
            .build_cartesian_2d(-0.5..(n as f64 - 0.5), y_min..y_max)
            .map_err(render_error)?;

        let categories = &bars.categories;
        chart
            .configure_mesh()
            .disable_x_mesh()
            .max_light_lines(0)
            .bold_line_style(BLACK.mix(0.15))
            .x_labels(n)
            .x_label_formatter(&|x| category_at(categories, *x))
            .y_label_formatter(&|y| format!("{:.0}", y))
            .x_desc(bars.x_desc.as_str())
            .y_desc(cfg.labels.amount_axis.as_str())
            .label_style((family, cfg.px(cfg.tick_pt)).into_font())
            .axis_desc_style((family, cfg.px(cfg.axis_label_pt)).into_font())
            .draw()
            .map_err(render_error)?;

        let half = cfg.bar_width / 2.0;
        let swatch = cfg.px(4.0) as i32;
        let series = [
            (&bars.income, -half, cfg.income_color, cfg.labels.income.as_str()),
            (&bars.expense, half, cfg.expense_color, cfg.labels.expense.as_str()),
        ];
        for (values, offset, color, label) in series {
            let style = color.mix(cfg.bar_alpha).filled();
            chart
                .draw_series(bar_rects(values, offset, cfg.bar_width, style))
                .map_err(render_error)?
                .label(label)
                .legend(move |(x, y)| {
                    Rectangle::new([(x, y - swatch), (x + 2 * swatch, y + swatch)], style)
                });
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .label_font((family, cfg.px(cfg.legend_pt)).into_font())
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK.mix(0.3))
            .draw()
            .map_err(render_error)?;

        root.present().map_err(|e| {
            tracing::error!("Failed to write {}: {}", path.display(), e);
            AppError::OutputWrite(format!("{}: {}", path.display(), e))
        })?;

        tracing::info!("Wrote {} in {:?}", path.display(), start.elapsed());
        Ok(())
    }
}

/// The output directory must already exist; it is never created.
pub fn ensure_output_dir(path: &Path) -> Result<(), AppError> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));

    if !dir.is_dir() {
        tracing::error!("Output directory does not exist: {}", dir.display());
        return Err(AppError::OutputDirMissing(dir.to_path_buf()));
    }
    Ok(())
}

/// Y axis bounds: always includes zero, with 10% head room.
pub fn value_range<I: IntoIterator<Item = f64>>(values: I) -> (f64, f64) {
    let (min, max) = values
        .into_iter()
        .fold((0.0_f64, 0.0_f64), |(lo, hi), v| (lo.min(v), hi.max(v)));

    if max - min <= f64::EPSILON {
        return (0.0, 1.0);
    }

    let pad = (max - min) * 0.1;
    let lower = if min < 0.0 { min - pad } else { 0.0 };
    let upper = if max > 0.0 { max + pad } else { 0.0 };
    (lower, upper)
}

/// Tick label for an x position; only whole category indices get text.
fn category_at(categories: &[String], x: f64) -> String {
    let idx = x.round();
    if (x - idx).abs() > 1e-6 || idx < 0.0 {
        return String::new();
    }
    categories.get(idx as usize).cloned().unwrap_or_default()
}

fn bar_rects(
    values: &[Option<f64>],
    offset: f64,
    width: f64,
    style: ShapeStyle,
) -> impl Iterator<Item = Rectangle<(f64, f64)>> + '_ {
    values.iter().enumerate().filter_map(move |(i, value)| {
        value.map(|v| {
            let center = i as f64 + offset;
            Rectangle::new([(center - width / 2.0, 0.0), (center + width / 2.0, v)], style)
        })
    })
}

/// Font files read so far. plotters keeps registered fonts for the life of the
/// process, so each file is read and leaked at most once.
static FONT_BYTES: OnceLock<Mutex<HashMap<PathBuf, &'static [u8]>>> = OnceLock::new();

fn font_bytes(path: &Path) -> Result<&'static [u8], AppError> {
    let mut cache = FONT_BYTES
        .get_or_init(Default::default)
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());

    if let Some(bytes) = cache.get(path) {
        return Ok(*bytes);
    }

    let bytes = std::fs::read(path).map_err(|e| {
        tracing::error!("Failed to read font {}: {}", path.display(), e);
        if e.kind() == std::io::ErrorKind::NotFound {
            AppError::FontNotFound(path.to_path_buf())
        } else {
            AppError::Io(e)
        }
    })?;

    let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
    cache.insert(path.to_path_buf(), bytes);
    Ok(bytes)
}

fn register_report_font(config: &RenderConfig) -> Result<(), AppError> {
    let path = &config.font_path;
    let bytes = font_bytes(path)?;

    let faces = [
        (config.font_family.as_str(), FontStyle::Normal),
        (config.font_family.as_str(), FontStyle::Bold),
        ("sans-serif", FontStyle::Normal),
    ];
    for (family, style) in faces {
        plotters::style::register_font(family, style, bytes).map_err(|_| {
            tracing::error!("{} is not a usable font", path.display());
            AppError::InvalidFont(path.clone())
        })?;
    }

    tracing::info!("Registered font {} as '{}'", path.display(), config.font_family);
    Ok(())
}

fn render_error<E: std::fmt::Display>(err: E) -> AppError {
    tracing::error!("Chart rendering failed: {}", err);
    AppError::Render(err.to_string())
}
