use crate::config::Config;
use crate::error::AppError;
use crate::models::{Aggregation, ReportSummary};
use crate::services::aggregator::Aggregator;
use crate::services::chart::ChartRenderer;
use crate::services::excel::{SheetLoader, TotalsExtractor};
use std::path::Path;

/// Loads the workbook and builds the month and quarter tables.
pub fn analyze(config: &Config) -> Result<Aggregation, AppError> {
    let sheets = SheetLoader::new(config.sheet_prefix()).load_path(&config.input_path)?;

    let extractor = TotalsExtractor::new(
        config.income_label.as_str(),
        config.expense_label.as_str(),
        config.strict,
    );
    let totals = extractor.extract_all(&sheets)?;

    let aggregator = Aggregator::new(config.year);
    let monthly = aggregator.monthly_records(
        sheets.iter().map(|s| s.name.as_str()).zip(totals),
    )?;
    let aggregation = aggregator.aggregate(monthly)?;

    for m in &aggregation.monthly {
        tracing::info!(
            "{} month={} quarter={} income={:?} expense={:?}",
            m.sheet_name,
            m.month_label,
            m.quarter_label,
            m.income,
            m.expense
        );
    }
    for q in &aggregation.quarterly {
        tracing::info!("{} income={} expense={}", q.quarter_label, q.income_sum, q.expense_sum);
    }

    Ok(aggregation)
}

pub fn run(config: &Config) -> Result<ReportSummary, AppError> {
    let start = std::time::Instant::now();
    let aggregation = analyze(config)?;

    let renderer = ChartRenderer::new(config.render.clone())?;
    let quarterly_chart = config.quarterly_chart_path();
    let monthly_chart = config.monthly_chart_path();

    renderer.render_quarterly(&aggregation.quarterly, &quarterly_chart)?;
    renderer.render_monthly(&aggregation.monthly, &monthly_chart)?;

    if config.show {
        show_charts(&[quarterly_chart.as_path(), monthly_chart.as_path()]);
    }

    let summary = ReportSummary {
        aggregation,
        quarterly_chart,
        monthly_chart,
    };

    match serde_json::to_string(&summary) {
        Ok(json) => tracing::debug!("Report summary: {}", json),
        Err(e) => tracing::warn!("Failed to serialize report summary: {}", e),
    }
    tracing::info!("Report finished in {:?}", start.elapsed());

    Ok(summary)
}

/// Opens each chart in the system image viewer. The files are already written,
/// so a viewer failure is only logged.
fn show_charts(paths: &[&Path]) {
    for path in paths {
        match opener::open(path) {
            Ok(()) => tracing::info!("Opened {} in the image viewer", path.display()),
            Err(e) => tracing::warn!("Failed to open {}: {}", path.display(), e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RenderConfig;
    use rust_xlsxwriter::Workbook;
    use tempfile::TempDir;

    fn write_workbook(path: &Path) {
        let mut workbook = Workbook::new();
        for (month, income, expense) in [(1, 1000.0, 400.0), (2, 2000.0, 600.0), (4, 500.0, 100.0)] {
            let sheet = workbook.add_worksheet();
            sheet.set_name(&format!("2024.{:02}", month)).unwrap();
            sheet.write_string(0, 0, "項目").unwrap();
            sheet.write_string(1, 0, "總收入").unwrap();
            sheet.write_number(1, 1, income).unwrap();
            sheet.write_string(2, 0, "總支出").unwrap();
            sheet.write_number(2, 1, expense).unwrap();
        }
        {
            let sheet = workbook.add_worksheet();
            sheet.set_name("2024.05").unwrap();
            sheet.write_string(0, 0, "總收入").unwrap();
            sheet.write_number(0, 1, 70.0).unwrap();
        }
        workbook.save(path).unwrap();
    }

    fn test_config(dir: &Path) -> Config {
        Config {
            year: 2024,
            input_path: dir.join("2024.xlsx"),
            output_dir: dir.to_path_buf(),
            income_label: "總收入".to_string(),
            expense_label: "總支出".to_string(),
            strict: false,
            show: false,
            render: RenderConfig {
                font_path: dir.join("missing.ttf"),
                ..RenderConfig::default()
            },
        }
    }

    #[test]
    fn test_analyze_builds_month_and_quarter_tables() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(temp_dir.path());
        write_workbook(&config.input_path);

        let aggregation = analyze(&config).unwrap();

        let months: Vec<u32> = aggregation.monthly.iter().map(|m| m.month).collect();
        assert_eq!(months, vec![1, 2, 4, 5]);
        assert_eq!(aggregation.monthly[3].expense, None);

        assert_eq!(aggregation.quarterly.len(), 2);
        assert_eq!(aggregation.quarterly[0].quarter_label, "2024-Q1");
        assert_eq!(aggregation.quarterly[0].income_sum, 3000.0);
        assert_eq!(aggregation.quarterly[0].expense_sum, 1000.0);
        assert_eq!(aggregation.quarterly[1].income_sum, 570.0);
        assert_eq!(aggregation.quarterly[1].expense_sum, 100.0);
    }

    #[test]
    fn test_strict_mode_stops_on_missing_total() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = test_config(temp_dir.path());
        config.strict = true;
        write_workbook(&config.input_path);

        let err = analyze(&config).unwrap_err();
        assert!(matches!(err, AppError::MissingTotal { ref sheet, .. } if sheet == "2024.05"));
    }

    #[test]
    fn test_run_fails_without_font() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(temp_dir.path());
        write_workbook(&config.input_path);

        let err = run(&config).unwrap_err();
        assert!(matches!(err, AppError::FontNotFound(_)));
        assert!(!config.quarterly_chart_path().exists());
    }

    #[test]
    fn test_run_writes_both_charts_in_order() {
        let font = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/DejaVuSansMono.ttf");
        if !font.is_file() {
            eprintln!("font fixture {} not found, skipping", font.display());
            return;
        }

        let temp_dir = TempDir::new().unwrap();
        let mut config = test_config(temp_dir.path());
        config.render.font_path = font;
        config.render.dpi = 40;
        write_workbook(&config.input_path);

        let summary = run(&config).unwrap();

        assert_eq!(summary.quarterly_chart, config.quarterly_chart_path());
        assert_eq!(summary.monthly_chart, config.monthly_chart_path());
        assert!(summary.quarterly_chart.is_file());
        assert!(summary.monthly_chart.is_file());
        assert_eq!(summary.aggregation.quarterly.len(), 2);
    }

    #[test]
    fn test_run_fails_on_missing_input() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(temp_dir.path());

        let err = run(&config).unwrap_err();
        assert!(matches!(err, AppError::InputNotFound(_)));
    }
}
