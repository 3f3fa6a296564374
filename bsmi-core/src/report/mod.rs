//! Report and graph writers
//!
//! Every writer answers which kind of report it produces and whether an
//! output path has an extension it can write, so that a caller can reject a
//! bad output path before any model data is read.

mod dot;
mod html;
mod json;
mod workbook;
mod xlsx;

pub use dot::DotFileGenerator;
pub use html::HtmlReportGenerator;
pub use json::JsonReportGenerator;
pub use workbook::{build_workbook, Sheet, Workbook, WorkbookReport, INFO_SHEET, REQUIREMENTS_SHEET};
pub use xlsx::XlsxReportGenerator;

use std::path::Path;

use crate::allocation::AllocationWarning;
use crate::config::DEFAULT_UNALLOCATED_CODE;
use crate::error::{BsmiError, Result};
use crate::index::ModelIndex;
use crate::models::{Specification, ALLOCATION_PARAMETER, UNALLOCATED_SENTINEL};

/// Allocation settings used while building a tabular report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSettings {
    pub allocation_parameter: String,
    pub unallocated_code: String,
    pub unallocated_sentinel: String,
    pub include_empty_containers: bool,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            allocation_parameter: ALLOCATION_PARAMETER.to_string(),
            unallocated_code: DEFAULT_UNALLOCATED_CODE.to_string(),
            unallocated_sentinel: UNALLOCATED_SENTINEL.to_string(),
            include_empty_containers: false,
        }
    }
}

/// Common surface of all writers
pub trait ReportGenerator {
    /// Human readable name of the produced report, e.g. "DOT"
    fn report_kind(&self) -> &'static str;

    /// Extensions, including the dot, this writer accepts
    fn supported_extensions(&self) -> &'static [&'static str];

    /// Checks the extension of `path`, returning a message either way
    fn is_supported_output_extension(&self, path: &Path) -> (bool, String) {
        let extension = path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();

        let supported = self.supported_extensions();
        if supported.contains(&extension.as_str()) {
            return (true, format!("{} is a supported report extension", extension));
        }

        (
            false,
            format!(
                "The Extension of the output file '{}' is not supported. {}",
                extension,
                describe_extensions(supported)
            ),
        )
    }
}

/// Writers of the allocation workbook
pub trait TabularReportGenerator: ReportGenerator {
    /// Builds the workbook over `specifications` and writes it to `output`
    fn generate(
        &self,
        index: &ModelIndex<'_>,
        specifications: &[&Specification],
        settings: &ReportSettings,
        output: &Path,
    ) -> Result<Vec<AllocationWarning>>;
}

fn describe_extensions(supported: &[&str]) -> String {
    let quoted: Vec<String> = supported.iter().map(|e| format!("'{}'", e)).collect();
    match quoted.as_slice() {
        [] => "No extensions are supported".to_string(),
        [only] => format!("Supported extensions is {}", only),
        [init @ .., last] => format!("Supported extensions are {} and {}", init.join(", "), last),
    }
}

/// Fails with `NullOutputTarget` on an empty path and `UnsupportedExtension`
/// on an extension the writer cannot produce
pub(crate) fn check_output(generator: &dyn ReportGenerator, output: &Path) -> Result<()> {
    if output.as_os_str().is_empty() {
        return Err(BsmiError::NullOutputTarget);
    }
    let (supported, message) = generator.is_supported_output_extension(output);
    if !supported {
        log::warn!("{}", message);
        return Err(BsmiError::UnsupportedExtension(output.to_path_buf()));
    }
    Ok(())
}
