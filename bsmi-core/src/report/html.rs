use chrono::Local;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use crate::allocation::AllocationWarning;
use crate::error::Result;
use crate::index::ModelIndex;
use crate::models::Specification;
use crate::report::workbook::{build_workbook, Workbook};
use crate::report::{check_output, ReportGenerator, ReportSettings, TabularReportGenerator};

const STYLE: &str = "body { font-family: Helvetica, Arial, sans-serif; margin: 2em; }
table { border-collapse: collapse; margin-bottom: 2em; }
th, td { border: 1px solid #ccc; padding: 4px 8px; text-align: left; vertical-align: top; }
th { background: #eee; }
nav a { margin-right: 1em; }";

/// Writes the allocation workbook as a single HTML page, one table per sheet
#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlReportGenerator;

impl HtmlReportGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Renders a workbook as a standalone HTML document
    pub fn render(&self, workbook: &Workbook) -> String {
        let mut html = String::new();
        let title = html_escape(&workbook.title);

        html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
        let _ = writeln!(html, "<title>{}</title>", title);
        let _ = writeln!(html, "<style>\n{}\n</style>", STYLE);
        html.push_str("</head>\n<body>\n");
        let _ = writeln!(html, "<h1>{}</h1>", title);

        html.push_str("<nav>\n");
        for (n, sheet) in workbook.sheets.iter().enumerate() {
            let _ = writeln!(html, "<a href=\"#sheet-{}\">{}</a>", n, html_escape(&sheet.name));
        }
        html.push_str("</nav>\n");

        for (n, sheet) in workbook.sheets.iter().enumerate() {
            let _ = writeln!(html, "<h2 id=\"sheet-{}\">{}</h2>", n, html_escape(&sheet.name));
            html.push_str("<table>\n<thead>\n<tr>");
            for column in &sheet.columns {
                let _ = write!(html, "<th>{}</th>", html_escape(column));
            }
            html.push_str("</tr>\n</thead>\n<tbody>\n");
            for row in &sheet.rows {
                html.push_str("<tr>");
                for cell in row {
                    let _ = write!(html, "<td>{}</td>", html_escape(cell));
                }
                html.push_str("</tr>\n");
            }
            html.push_str("</tbody>\n</table>\n");
        }

        html.push_str("</body>\n</html>\n");
        html
    }
}

impl ReportGenerator for HtmlReportGenerator {
    fn report_kind(&self) -> &'static str {
        "HTML"
    }

    fn supported_extensions(&self) -> &'static [&'static str] {
        &[".html", ".htm"]
    }
}

impl TabularReportGenerator for HtmlReportGenerator {
    fn generate(
        &self,
        index: &ModelIndex<'_>,
        specifications: &[&Specification],
        settings: &ReportSettings,
        output: &Path,
    ) -> Result<Vec<AllocationWarning>> {
        check_output(self, output)?;
        log::info!("generating HTML BSMI report");

        let report = build_workbook(index, specifications, settings, Local::now())?;
        fs::write(output, self.render(&report.workbook))?;

        log::info!("saved BSMI report to {}", output.display());
        Ok(report.warnings)
    }
}

fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
