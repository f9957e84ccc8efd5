use anyhow::{bail, Context, Result};
use dotenvy::dotenv;
use plotters::style::RGBColor;
use std::path::PathBuf;

const DEFAULT_YEAR: u32 = 2024;
const DEFAULT_DPI: u32 = 300;
const MIN_DPI: u32 = 10;

#[derive(Debug, Clone)]
pub struct Config {
    pub year: u32,
    pub input_path: PathBuf,
    pub output_dir: PathBuf,
    pub income_label: String,
    pub expense_label: String,
    /// Missing or conflicting totals abort the run instead of being logged.
    pub strict: bool,
    /// Open the written charts in the system image viewer.
    pub show: bool,
    pub render: RenderConfig,
}

impl Config {
    pub fn new() -> Result<Self> {
        dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from a variable lookup, falling back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let year = parse_var(var("REPORT_YEAR"), "REPORT_YEAR", DEFAULT_YEAR)?;
        let dpi = parse_var(var("REPORT_DPI"), "REPORT_DPI", DEFAULT_DPI)?;
        let strict = parse_var(var("REPORT_STRICT"), "REPORT_STRICT", false)?;
        let show = parse_var(var("REPORT_SHOW"), "REPORT_SHOW", true)?;

        if dpi < MIN_DPI {
            bail!("REPORT_DPI must be at least {}, got {}", MIN_DPI, dpi);
        }

        let input_path = var("REPORT_INPUT")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(format!("data/{}.xlsx", year)));
        let output_dir = var("REPORT_OUTPUT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("output"));

        let defaults = RenderConfig::default();
        let render = RenderConfig {
            dpi,
            font_path: var("REPORT_FONT")
                .map(PathBuf::from)
                .unwrap_or(defaults.font_path.clone()),
            ..defaults
        };

        Ok(Config {
            year,
            input_path,
            output_dir,
            income_label: var("REPORT_INCOME_LABEL").unwrap_or_else(|| "總收入".to_string()),
            expense_label: var("REPORT_EXPENSE_LABEL").unwrap_or_else(|| "總支出".to_string()),
            strict,
            show,
            render,
        })
    }

    /// Month sheets are named `{year}.{month}`.
    pub fn sheet_prefix(&self) -> String {
        format!("{}.", self.year)
    }

    pub fn quarterly_chart_path(&self) -> PathBuf {
        self.output_dir.join("quarterly_income_expense.png")
    }

    pub fn monthly_chart_path(&self) -> PathBuf {
        self.output_dir.join("monthly_income_expense.png")
    }
}

fn parse_var<T>(value: Option<String>, key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match value {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Failed to parse {}={}", key, raw)),
        None => Ok(default),
    }
}

/// Localized chart text.
#[derive(Debug, Clone)]
pub struct ChartLabels {
    pub income: String,
    pub expense: String,
    pub amount_axis: String,
    pub quarter_axis: String,
    pub month_axis: String,
    pub quarterly_title: String,
    pub monthly_title: String,
}

impl Default for ChartLabels {
    fn default() -> Self {
        Self {
            income: "收入".to_string(),
            expense: "支出".to_string(),
            amount_axis: "金額".to_string(),
            quarter_axis: "季度".to_string(),
            month_axis: "月份".to_string(),
            quarterly_title: "公司收支狀況".to_string(),
            monthly_title: "公司每月收支狀況".to_string(),
        }
    }
}

/// Everything the chart renderer needs; nothing is read from global state.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    pub font_path: PathBuf,
    pub font_family: String,
    pub width_in: f64,
    pub height_in: f64,
    pub dpi: u32,
    pub income_color: RGBColor,
    pub expense_color: RGBColor,
    pub bar_alpha: f64,
    pub bar_width: f64,
    pub quarterly_title_pt: f64,
    pub monthly_title_pt: f64,
    pub axis_label_pt: f64,
    pub tick_pt: f64,
    pub legend_pt: f64,
    pub labels: ChartLabels,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            font_path: PathBuf::from("font/TraditionalChinese.ttf"),
            font_family: "report-cjk".to_string(),
            width_in: 12.0,
            height_in: 6.0,
            dpi: DEFAULT_DPI,
            income_color: RGBColor(0xf4, 0xa5, 0x82),
            expense_color: RGBColor(0x92, 0xc5, 0xde),
            bar_alpha: 0.8,
            bar_width: 0.35,
            quarterly_title_pt: 26.0,
            monthly_title_pt: 18.0,
            axis_label_pt: 12.0,
            tick_pt: 10.0,
            legend_pt: 10.0,
            labels: ChartLabels::default(),
        }
    }
}

impl RenderConfig {
    pub fn pixel_size(&self) -> (u32, u32) {
        (
            (self.width_in * self.dpi as f64).round() as u32,
            (self.height_in * self.dpi as f64).round() as u32,
        )
    }

    /// Converts a point size to pixels at the configured DPI.
    pub fn px(&self, points: f64) -> f64 {
        points * self.dpi as f64 / 72.0
    }
}
