use serde::Serialize;
use std::path::PathBuf;

/// Totals for one month sheet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyRecord {
    pub sheet_name: String,
    /// Raw month segment of the sheet name, e.g. "03".
    pub month_label: String,
    pub month: u32,
    pub quarter_label: String,
    pub income: Option<f64>,
    pub expense: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuarterlyRecord {
    pub quarter_label: String,
    pub income_sum: f64,
    pub expense_sum: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Aggregation {
    pub monthly: Vec<MonthlyRecord>,
    pub quarterly: Vec<QuarterlyRecord>,
}

#[derive(Debug, Serialize)]
pub struct ReportSummary {
    pub aggregation: Aggregation,
    pub quarterly_chart: PathBuf,
    pub monthly_chart: PathBuf,
}
