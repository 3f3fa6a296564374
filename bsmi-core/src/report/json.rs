use chrono::Local;
use std::fs;
use std::path::Path;

use crate::allocation::AllocationWarning;
use crate::error::Result;
use crate::index::ModelIndex;
use crate::models::Specification;
use crate::report::workbook::build_workbook;
use crate::report::{check_output, ReportGenerator, ReportSettings, TabularReportGenerator};

/// Writes the allocation workbook as pretty printed JSON
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonReportGenerator;

impl JsonReportGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl ReportGenerator for JsonReportGenerator {
    fn report_kind(&self) -> &'static str {
        "JSON"
    }

    fn supported_extensions(&self) -> &'static [&'static str] {
        &[".json"]
    }
}

impl TabularReportGenerator for JsonReportGenerator {
    fn generate(
        &self,
        index: &ModelIndex<'_>,
        specifications: &[&Specification],
        settings: &ReportSettings,
        output: &Path,
    ) -> Result<Vec<AllocationWarning>> {
        check_output(self, output)?;
        log::info!("generating JSON BSMI report");

        let report = build_workbook(index, specifications, settings, Local::now())?;
        let json = serde_json::to_string_pretty(&report.workbook)?;
        fs::write(output, json)?;

        log::info!("saved BSMI report to {}", output.display());
        Ok(report.warnings)
    }
}
