use crate::error::AppError;
use crate::models::{Aggregation, MonthlyRecord, QuarterlyRecord};
use crate::services::excel::types::SheetTotals;
use polars::prelude::*;

pub fn quarter_of(month: u32) -> u32 {
    (month - 1) / 3 + 1
}

pub fn quarter_label(year: u32, month: u32) -> String {
    format!("{}-Q{}", year, quarter_of(month))
}

/// Parses the month from the second dot-delimited segment, e.g. "2024.03" -> 3.
pub fn parse_month(sheet_name: &str) -> Result<(String, u32), AppError> {
    let invalid = |reason: String| AppError::InvalidSheetName {
        sheet: sheet_name.to_string(),
        reason,
    };

    let segment = sheet_name
        .split('.')
        .nth(1)
        .ok_or_else(|| invalid("missing month segment".to_string()))?;

    let month: u32 = segment
        .trim()
        .parse()
        .map_err(|e| invalid(format!("month '{}' is not an integer: {}", segment, e)))?;

    if !(1..=12).contains(&month) {
        return Err(invalid(format!("month {} is outside 1-12", month)));
    }

    Ok((segment.to_string(), month))
}

pub struct Aggregator {
    year: u32,
}

impl Aggregator {
    pub fn new(year: u32) -> Self {
        Self { year }
    }

    pub fn monthly_records<'a, I>(&self, totals: I) -> Result<Vec<MonthlyRecord>, AppError>
    where
        I: IntoIterator<Item = (&'a str, SheetTotals)>,
    {
        totals
            .into_iter()
            .map(|(sheet_name, totals)| {
                let (month_label, month) = parse_month(sheet_name)?;
                Ok(MonthlyRecord {
                    sheet_name: sheet_name.to_string(),
                    month_label,
                    month,
                    quarter_label: quarter_label(self.year, month),
                    income: totals.income.value,
                    expense: totals.expense.value,
                })
            })
            .collect()
    }

    /// Sums income and expense per quarter. Missing monthly values count as zero;
    /// quarters are ordered by first appearance.
    pub fn quarterly(&self, monthly: &[MonthlyRecord]) -> Result<Vec<QuarterlyRecord>, AppError> {
        if monthly.is_empty() {
            return Ok(Vec::new());
        }

        let df = monthly_frame(monthly)?;
        let summary = df
            .lazy()
            .group_by_stable([col("quarter")])
            .agg([col("income").sum(), col("expense").sum()])
            .collect()?;

        tracing::debug!("Quarterly summary: {:?}", summary);

        let quarters = summary.column("quarter")?.str()?;
        let income = summary.column("income")?.f64()?;
        let expense = summary.column("expense")?.f64()?;

        let records = quarters
            .into_iter()
            .zip(income.into_iter())
            .zip(expense.into_iter())
            .map(|((quarter, income), expense)| QuarterlyRecord {
                quarter_label: quarter.unwrap_or_default().to_string(),
                income_sum: income.unwrap_or(0.0),
                expense_sum: expense.unwrap_or(0.0),
            })
            .collect();

        Ok(records)
    }

    pub fn aggregate(&self, monthly: Vec<MonthlyRecord>) -> Result<Aggregation, AppError> {
        let quarterly = self.quarterly(&monthly)?;
        Ok(Aggregation { monthly, quarterly })
    }
}

fn monthly_frame(monthly: &[MonthlyRecord]) -> Result<DataFrame, AppError> {
    let sheets: Vec<String> = monthly.iter().map(|r| r.sheet_name.clone()).collect();
    let months: Vec<u32> = monthly.iter().map(|r| r.month).collect();
    let quarters: Vec<String> = monthly.iter().map(|r| r.quarter_label.clone()).collect();
    let income: Vec<Option<f64>> = monthly.iter().map(|r| r.income).collect();
    let expense: Vec<Option<f64>> = monthly.iter().map(|r| r.expense).collect();

    DataFrame::new(vec![
        Series::new("sheet", sheets),
        Series::new("month", months),
        Series::new("quarter", quarters),
        Series::new("income", income),
        Series::new("expense", expense),
    ])
    .map_err(|e| AppError::DataFrame(format!("Failed to create DataFrame: {}", e)))
}
