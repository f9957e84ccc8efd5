use calamine::Data;

/// One month sheet as read from the workbook.
#[derive(Debug, Clone)]
pub struct SheetData {
    pub name: String,
    pub rows: Vec<Vec<Data>>,
}

/// Outcome of resolving one labeled total within a sheet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TotalMatch {
    pub value: Option<f64>,
    /// Matching rows that carried at least one number.
    pub candidates: usize,
    /// More than one distinct candidate row-sum was found.
    pub ambiguous: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SheetTotals {
    pub income: TotalMatch,
    pub expense: TotalMatch,
}
