use calamine::Data;

/// Numeric value of a cell, or `None` when it does not coerce to a number.
pub fn cell_to_number(cell: &Data) -> Option<f64> {
    match cell {
        Data::Float(f) if f.is_finite() => Some(*f),
        Data::Int(i) => Some(*i as f64),
        Data::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}

pub fn cell_contains(cell: &Data, needle: &str) -> bool {
    match cell {
        Data::Empty => false,
        Data::String(s) => s.contains(needle),
        _ => cell.to_string().contains(needle),
    }
}

pub fn row_contains(row: &[Data], needle: &str) -> bool {
    row.iter().any(|cell| cell_contains(cell, needle))
}

/// Sum of the row's numeric cells, `None` if the row has none.
pub fn numeric_row_sum(row: &[Data]) -> Option<f64> {
    row.iter()
        .filter_map(cell_to_number)
        .fold(None, |acc, v| Some(acc.unwrap_or(0.0) + v))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_to_number_coerces_numeric_text() {
        assert_eq!(cell_to_number(&Data::Float(12.5)), Some(12.5));
        assert_eq!(cell_to_number(&Data::Int(7)), Some(7.0));
        assert_eq!(cell_to_number(&Data::String(" 300 ".to_string())), Some(300.0));
        assert_eq!(cell_to_number(&Data::String("總收入".to_string())), None);
        assert_eq!(cell_to_number(&Data::Bool(true)), None);
        assert_eq!(cell_to_number(&Data::Empty), None);
    }

    #[test]
    fn test_row_contains_matches_substring() {
        let row = vec![
            Data::Empty,
            Data::String("本月總收入(含稅)".to_string()),
            Data::Float(10.0),
        ];
        assert!(row_contains(&row, "總收入"));
        assert!(!row_contains(&row, "總支出"));
    }

    #[test]
    fn test_numeric_row_sum() {
        let row = vec![
            Data::String("總收入".to_string()),
            Data::Float(100.0),
            Data::Int(200),
            Data::String("300".to_string()),
            Data::Empty,
        ];
        assert_eq!(numeric_row_sum(&row), Some(600.0));

        let labels_only = vec![Data::String("總收入".to_string()), Data::Empty];
        assert_eq!(numeric_row_sum(&labels_only), None);
    }
}
