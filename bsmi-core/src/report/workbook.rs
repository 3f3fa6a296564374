//! The allocation workbook
//!
//! A format independent table model shared by the tabular writers: an info
//! sheet, a sheet listing the requirements of the selected specifications and
//! one allocation sheet per option.

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::allocation::{AllocationResolver, AllocationWarning};
use crate::derivation::DerivationIndex;
use crate::error::Result;
use crate::index::ModelIndex;
use crate::models::{ModelOption, Requirement, Specification};
use crate::nested::NestedElementTreeGenerator;
use crate::object_level::compute_object_level;
use crate::report::ReportSettings;

pub const INFO_SHEET: &str = "BSMI Info";
pub const REQUIREMENTS_SHEET: &str = "Requirements";

const REQUIREMENT_COLUMNS: [&str; 7] = [
    "Specification",
    "Group",
    "Requirements Shortname",
    "Requirements Name",
    "Requirements Text",
    "Owner",
    "Categories",
];

const OPTION_COLUMNS: [&str; 9] = [
    "Object Level",
    "UID",
    "BSMI Nummer",
    "Eistekst - EN",
    "Object Type",
    "Inlinks",
    "Outlinks",
    "Requirement - Iid",
    "Relationship - Iid",
];

/// Placeholder for an object level that cannot be computed
const UNKNOWN_LEVEL: &str = "-";

/// A named table of text cells
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Sheet {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Sheet {
    pub fn new(name: impl Into<String>, columns: &[&str]) -> Self {
        Self {
            name: name.into(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<String>) {
        debug_assert_eq!(row.len(), self.columns.len());
        self.rows.push(row);
    }

    /// Cell at `row` in the column titled `column`
    pub fn cell(&self, row: usize, column: &str) -> Option<&str> {
        let position = self.columns.iter().position(|c| c == column)?;
        self.rows.get(row)?.get(position).map(String::as_str)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Workbook {
    pub title: String,
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }
}

/// A built workbook with the findings made while building it
#[derive(Debug, Clone)]
pub struct WorkbookReport {
    pub workbook: Workbook,
    pub warnings: Vec<AllocationWarning>,
}

/// Builds the workbook for `specifications`, resolving every option of the
/// iteration
pub fn build_workbook(
    index: &ModelIndex<'_>,
    specifications: &[&Specification],
    settings: &ReportSettings,
    generated_at: DateTime<Local>,
) -> Result<WorkbookReport> {
    let iteration = index.iteration();
    let mut sheets = vec![info_sheet(index, generated_at), requirements_sheet(index, specifications)];
    let mut warnings = Vec::new();

    let generator = NestedElementTreeGenerator::new(index);
    let resolver = AllocationResolver::new(index)
        .with_parameter(settings.allocation_parameter.as_str())
        .with_sentinel(settings.unallocated_sentinel.as_str());
    let derivation = DerivationIndex::new(index);

    for option in &iteration.options {
        let allocation = resolver.resolve_option(
            &generator,
            specifications,
            option,
            settings.include_empty_containers,
            &settings.unallocated_code,
        )?;
        warnings.extend(allocation.warnings.iter().cloned());

        let mut sheet = Sheet::new(option.short_name.as_str(), &OPTION_COLUMNS);
        for record in &allocation.records {
            let level = object_level(record.requirement, &record.code, &mut warnings);
            sheet.push_row(vec![
                level,
                record.requirement.short_name.clone(),
                record.code.clone(),
                record.requirement.definition_content().to_string(),
                "Requirement".to_string(),
                derivation.incoming_short_names(record.requirement).join(", "),
                derivation.outgoing_short_names(record.requirement).join(", "),
                record.requirement.id.to_string(),
                record.relationship_ids(),
            ]);
        }
        log_sheet(option, &sheet);
        sheets.push(sheet);
    }

    Ok(WorkbookReport {
        workbook: Workbook {
            title: workbook_title(index),
            sheets,
        },
        warnings,
    })
}

fn workbook_title(index: &ModelIndex<'_>) -> String {
    let model = &index.iteration().model;
    if model.short_name.is_empty() {
        "BSMI Report".to_string()
    } else {
        format!("BSMI Report - {}", model.short_name)
    }
}

fn object_level(requirement: &Requirement, code: &str, warnings: &mut Vec<AllocationWarning>) -> String {
    match compute_object_level(code) {
        Ok(level) => level,
        Err(_) => {
            let warning = AllocationWarning::MalformedCode {
                requirement: requirement.short_name.clone(),
                code: code.to_string(),
            };
            log::warn!("{}", warning);
            warnings.push(warning);
            UNKNOWN_LEVEL.to_string()
        }
    }
}

fn log_sheet(option: &ModelOption, sheet: &Sheet) {
    log::debug!("option sheet {} has {} rows", option.short_name, sheet.rows.len());
}

fn info_sheet(index: &ModelIndex<'_>, generated_at: DateTime<Local>) -> Sheet {
    let iteration = index.iteration();
    let model = &iteration.model;

    let mut sheet = Sheet::new(INFO_SHEET, &["Item", "Value"]);
    let rows = [
        ("BSMI Reporting", env!("CARGO_PKG_VERSION").to_string()),
        ("Generation Date", generated_at.format("%Y-%m-%d %H:%M:%S").to_string()),
        ("Model - name", model.name.clone()),
        ("Model - short name", model.short_name.clone()),
        ("Model - Definition", model.definition.clone()),
        ("Iteration - nr", iteration.number.to_string()),
        (
            "Iteration - Created On",
            iteration
                .created_on
                .map(|d| d.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_default(),
        ),
        ("Iteration - Description", iteration.description.clone()),
    ];
    for (item, value) in rows {
        sheet.push_row(vec![item.to_string(), value]);
    }
    sheet
}

fn requirements_sheet(index: &ModelIndex<'_>, specifications: &[&Specification]) -> Sheet {
    let mut sheet = Sheet::new(REQUIREMENTS_SHEET, &REQUIREMENT_COLUMNS);

    for spec in specifications {
        for requirement in spec.requirements.iter().filter(|r| r.group.is_none()) {
            sheet.push_row(requirement_row(index, spec, requirement));
        }
        for group in spec.groups_depth_first() {
            for requirement in spec.requirements.iter().filter(|r| r.group == Some(group.id)) {
                sheet.push_row(requirement_row(index, spec, requirement));
            }
        }
    }

    sheet
}

fn requirement_row(index: &ModelIndex<'_>, spec: &Specification, requirement: &Requirement) -> Vec<String> {
    vec![
        spec.short_name.clone(),
        index.group_path(requirement).unwrap_or_default(),
        requirement.short_name.clone(),
        requirement.name.clone(),
        requirement.definition_content().to_string(),
        index.owner_short_name(requirement).to_string(),
        index.category_summary(requirement),
    ]
}
