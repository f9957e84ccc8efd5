use super::types::SheetData;
use crate::error::AppError;
use bytes::Bytes;
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use std::io::Cursor;
use std::path::Path;

/// Reads the month sheets of a workbook.
pub struct SheetLoader {
    prefix: String,
}

impl SheetLoader {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into() }
    }

    pub fn load_path(&self, path: &Path) -> Result<Vec<SheetData>, AppError> {
        if !path.is_file() {
            tracing::error!("Input workbook not found: {}", path.display());
            return Err(AppError::InputNotFound(path.to_path_buf()));
        }

        tracing::info!("Reading workbook {}", path.display());
        let file_data = std::fs::read(path)?;
        self.load_from_bytes(Bytes::from(file_data))
    }

    /// Returns every sheet whose name starts with the prefix, in workbook order.
    pub fn load_from_bytes(&self, file_data: Bytes) -> Result<Vec<SheetData>, AppError> {
        let start = std::time::Instant::now();
        let cursor = Cursor::new(file_data);

        // Format (xlsx, xlsm, xlsb, xls, ods) is detected from the content.
        let mut workbook = open_workbook_auto_from_rs(cursor)
            .map_err(|e| {
                tracing::error!("Failed to open workbook: {}", e);
                AppError::InvalidWorkbook(format!("Failed to open workbook: {}", e))
            })?;

        let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
        tracing::debug!("Found {} sheets: {:?}", sheet_names.len(), sheet_names);

        let matched: Vec<String> = sheet_names
            .into_iter()
            .filter(|name| name.starts_with(&self.prefix))
            .collect();

        if matched.is_empty() {
            tracing::error!("No sheet name starts with '{}'", self.prefix);
            return Err(AppError::NoMatchingSheets {
                prefix: self.prefix.clone(),
            });
        }

        let mut sheets = Vec::with_capacity(matched.len());
        for name in matched {
            let range = workbook.worksheet_range(&name).map_err(|e| {
                tracing::error!("Failed to read worksheet {}: {}", name, e);
                AppError::InvalidWorkbook(format!("Failed to read worksheet {}: {}", name, e))
            })?;

            let rows: Vec<Vec<Data>> = range.rows().map(|row| row.to_vec()).collect();
            tracing::debug!("Sheet {}: {} rows", name, rows.len());
            sheets.push(SheetData { name, rows });
        }

        tracing::info!("Loaded {} month sheets in {:?}", sheets.len(), start.elapsed());
        Ok(sheets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::Workbook;
    use tempfile::TempDir;

    fn sample_workbook() -> Bytes {
        let mut workbook = Workbook::new();
        {
            let sheet = workbook.add_worksheet();
            sheet.set_name("2024.01").unwrap();
            sheet.write_string(0, 0, "項目").unwrap();
            sheet.write_string(1, 0, "總收入").unwrap();
            sheet.write_number(1, 1, 1500.0).unwrap();
            sheet.write_string(2, 0, "總支出").unwrap();
            sheet.write_number(2, 1, 900.0).unwrap();
        }
        {
            let sheet = workbook.add_worksheet();
            sheet.set_name("notes").unwrap();
            sheet.write_string(0, 0, "scratch").unwrap();
        }
        {
            let sheet = workbook.add_worksheet();
            sheet.set_name("2024.02").unwrap();
            sheet.write_string(0, 0, "總收入").unwrap();
            sheet.write_number(0, 1, 10.0).unwrap();
        }
        {
            let sheet = workbook.add_worksheet();
            sheet.set_name("2023.12").unwrap();
            sheet.write_number(0, 0, 1.0).unwrap();
        }
        Bytes::from(workbook.save_to_buffer().unwrap())
    }

    #[test]
    fn test_loads_only_prefixed_sheets_in_order() {
        let loader = SheetLoader::new("2024.");
        let sheets = loader.load_from_bytes(sample_workbook()).unwrap();

        let names: Vec<&str> = sheets.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["2024.01", "2024.02"]);
        assert_eq!(sheets[0].rows.len(), 3);
        assert_eq!(sheets[0].rows[1][1], Data::Float(1500.0));
    }

    #[test]
    fn test_reads_workbook_format_from_content() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("report.data");
        std::fs::write(&path, sample_workbook()).unwrap();

        let sheets = SheetLoader::new("2024.").load_path(&path).unwrap();
        assert_eq!(sheets.len(), 2);
        assert_eq!(sheets[1].name, "2024.02");
    }

    #[test]
    fn test_no_matching_sheets() {
        let loader = SheetLoader::new("2030.");
        let err = loader.load_from_bytes(sample_workbook()).unwrap_err();
        assert!(matches!(err, AppError::NoMatchingSheets { prefix } if prefix == "2030."));
    }

    #[test]
    fn test_rejects_non_workbook_bytes() {
        let loader = SheetLoader::new("2024.");
        let err = loader
            .load_from_bytes(Bytes::from_static(b"definitely not a zip archive"))
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidWorkbook(_)));
    }

    #[test]
    fn test_missing_input_path() {
        let temp_dir = TempDir::new().unwrap();
        let loader = SheetLoader::new("2024.");
        let err = loader
            .load_path(&temp_dir.path().join("missing.xlsx"))
            .unwrap_err();
        assert!(matches!(err, AppError::InputNotFound(_)));
    }

    #[test]
    fn test_load_path_reads_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("2024.xlsx");
        std::fs::write(&path, sample_workbook()).unwrap();

        let sheets = SheetLoader::new("2024.").load_path(&path).unwrap();
        assert_eq!(sheets.len(), 2);
    }
}
