use super::types::{SheetData, SheetTotals, TotalMatch};
use super::utils::{numeric_row_sum, row_contains};
use crate::error::AppError;
use calamine::Data;
use rayon::prelude::*;

/// Resolves candidate row-sums to a single total by taking the largest one.
///
/// Label rows are noisy (subtotals, notes repeating the label), so several
/// candidates are common. The result is flagged as ambiguous whenever the
/// candidates disagree, so callers can warn or refuse.
pub fn select_total(candidates: &[f64]) -> TotalMatch {
    let value = candidates.iter().copied().reduce(f64::max);
    let ambiguous = match value {
        Some(max) => candidates.iter().any(|c| *c != max),
        None => false,
    };

    TotalMatch {
        value,
        candidates: candidates.len(),
        ambiguous,
    }
}

/// Row-sums of every row that mentions `label` and holds at least one number.
pub fn candidate_sums(rows: &[Vec<Data>], label: &str) -> Vec<f64> {
    rows.iter()
        .filter(|row| row_contains(row, label))
        .filter_map(|row| numeric_row_sum(row))
        .collect()
}

pub struct TotalsExtractor {
    income_label: String,
    expense_label: String,
    strict: bool,
}

impl TotalsExtractor {
    pub fn new(income_label: impl Into<String>, expense_label: impl Into<String>, strict: bool) -> Self {
        Self {
            income_label: income_label.into(),
            expense_label: expense_label.into(),
            strict,
        }
    }

    pub fn extract(&self, sheet: &SheetData) -> Result<SheetTotals, AppError> {
        let income = self.resolve(sheet, &self.income_label)?;
        let expense = self.resolve(sheet, &self.expense_label)?;

        tracing::debug!(
            "Sheet {}: income={:?} expense={:?}",
            sheet.name,
            income.value,
            expense.value
        );

        Ok(SheetTotals { income, expense })
    }

    /// Extracts every sheet; results keep the input order.
    pub fn extract_all(&self, sheets: &[SheetData]) -> Result<Vec<SheetTotals>, AppError> {
        sheets.par_iter().map(|sheet| self.extract(sheet)).collect()
    }

    fn resolve(&self, sheet: &SheetData, label: &str) -> Result<TotalMatch, AppError> {
        let found = select_total(&candidate_sums(&sheet.rows, label));

        if found.value.is_none() {
            if self.strict {
                tracing::error!("Sheet {} has no '{}' row", sheet.name, label);
                return Err(AppError::MissingTotal {
                    sheet: sheet.name.clone(),
                    label: label.to_string(),
                });
            }
            tracing::warn!("Sheet {} has no '{}' row, total left empty", sheet.name, label);
        }

        if found.ambiguous {
            if self.strict {
                tracing::error!(
                    "Sheet {} has {} conflicting '{}' rows",
                    sheet.name,
                    found.candidates,
                    label
                );
                return Err(AppError::AmbiguousTotal {
                    sheet: sheet.name.clone(),
                    label: label.to_string(),
                    candidates: found.candidates,
                });
            }
            tracing::warn!(
                "Sheet {} has {} conflicting '{}' rows, using the largest ({:?})",
                sheet.name,
                found.candidates,
                label,
                found.value
            );
        }

        Ok(found)
    }
}
