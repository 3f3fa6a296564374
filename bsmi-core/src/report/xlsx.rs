use chrono::Local;
use rust_xlsxwriter::{DocProperties, Format, Workbook as XlsxWorkbook};
use std::collections::HashSet;
use std::path::Path;

use crate::allocation::AllocationWarning;
use crate::error::Result;
use crate::index::ModelIndex;
use crate::models::Specification;
use crate::report::workbook::{build_workbook, Workbook};
use crate::report::{check_output, ReportGenerator, ReportSettings, TabularReportGenerator};

/// Longest worksheet name Excel accepts
const MAX_SHEET_NAME: usize = 31;

/// Writes the allocation workbook as an Excel file, one worksheet per sheet
#[derive(Debug, Default, Clone, Copy)]
pub struct XlsxReportGenerator;

impl XlsxReportGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Saves `workbook` to `output`
    pub fn write(&self, workbook: &Workbook, output: &Path) -> Result<()> {
        let mut xlsx = XlsxWorkbook::new();
        xlsx.set_properties(&DocProperties::new().set_title(&workbook.title));

        let header = Format::new().set_bold();
        let mut used = HashSet::new();

        for sheet in &workbook.sheets {
            let name = worksheet_name(&sheet.name, &mut used);
            if name != sheet.name {
                log::warn!("sheet {} is written as worksheet {}", sheet.name, name);
            }

            let worksheet = xlsx.add_worksheet();
            worksheet.set_name(name.as_str())?;

            for (col, column) in sheet.columns.iter().enumerate() {
                worksheet.write_string_with_format(0, col as u16, column.as_str(), &header)?;
            }
            for (row, cells) in sheet.rows.iter().enumerate() {
                for (col, cell) in cells.iter().enumerate() {
                    worksheet.write_string(row as u32 + 1, col as u16, cell.as_str())?;
                }
            }

            worksheet.set_freeze_panes(1, 0)?;
            worksheet.autofit();
        }

        xlsx.save(output)?;
        Ok(())
    }
}

impl ReportGenerator for XlsxReportGenerator {
    fn report_kind(&self) -> &'static str {
        "Excel"
    }

    fn supported_extensions(&self) -> &'static [&'static str] {
        &[".xlsx", ".xlsm", ".xltx", ".xltm"]
    }
}

impl TabularReportGenerator for XlsxReportGenerator {
    fn generate(
        &self,
        index: &ModelIndex<'_>,
        specifications: &[&Specification],
        settings: &ReportSettings,
        output: &Path,
    ) -> Result<Vec<AllocationWarning>> {
        check_output(self, output)?;
        log::info!("generating Excel BSMI report");

        let report = build_workbook(index, specifications, settings, Local::now())?;
        self.write(&report.workbook, output)?;

        log::info!("saved BSMI report to {}", output.display());
        Ok(report.warnings)
    }
}

/// A worksheet name Excel accepts, unique (ignoring case) among `used`
fn worksheet_name(name: &str, used: &mut HashSet<String>) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '[' | ']' | ':' | '*' | '?' | '/' | '\\' => '_',
            c => c,
        })
        .collect();
    let cleaned = cleaned.trim_matches('\'');
    let base: String = if cleaned.is_empty() {
        "Sheet".to_string()
    } else {
        cleaned.chars().take(MAX_SHEET_NAME).collect()
    };

    let mut candidate = base.clone();
    let mut n = 2;
    while !used.insert(candidate.to_lowercase()) {
        let suffix = format!(" ({})", n);
        let keep = MAX_SHEET_NAME - suffix.chars().count();
        candidate = format!("{}{}", base.chars().take(keep).collect::<String>(), suffix);
        n += 1;
    }
    candidate
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::SampleModel;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_worksheet_names() {
        let mut used = HashSet::new();
        assert_eq!(worksheet_name("OPT-1", &mut used), "OPT-1");
        assert_eq!(worksheet_name("opt-1", &mut used), "opt-1 (2)");
        assert_eq!(worksheet_name("A/B:C", &mut used), "A_B_C");
        assert_eq!(worksheet_name("''", &mut used), "Sheet");

        let long = "x".repeat(40);
        let first = worksheet_name(&long, &mut used);
        assert_eq!(first.chars().count(), 31);
        let second = worksheet_name(&long, &mut used);
        assert_eq!(second.chars().count(), 31);
        assert!(second.ends_with(" (2)"));
    }

    #[test]
    fn test_extension_message() {
        let generator = XlsxReportGenerator::new();
        assert!(generator.is_supported_output_extension(Path::new("out.xltm")).0);

        let (ok, message) = generator.is_supported_output_extension(Path::new("out.xls"));
        assert!(!ok);
        assert_eq!(
            message,
            "The Extension of the output file '.xls' is not supported. Supported extensions are '.xlsx', '.xlsm', '.xltx' and '.xltm'"
        );
    }

    #[test]
    fn test_generate_xlsx() {
        let sample = SampleModel::new();
        let index = ModelIndex::build(&sample.iteration).unwrap();
        let spec_a = index.specification(sample.spec_a).unwrap();
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("bsmi.xlsx");

        let warnings = XlsxReportGenerator::new()
            .generate(&index, &[spec_a], &ReportSettings::default(), &output)
            .unwrap();
        assert_eq!(warnings.len(), 1);

        // xlsx files are zip archives
        let bytes = fs::read(&output).unwrap();
        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn test_generate_rejects_other_extensions() {
        let sample = SampleModel::new();
        let index = ModelIndex::build(&sample.iteration).unwrap();
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("bsmi.csv");

        let result = XlsxReportGenerator::new().generate(&index, &[], &ReportSettings::default(), &output);
        assert!(result.is_err());
        assert!(!output.exists());
    }
}
