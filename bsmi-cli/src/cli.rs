use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(author, version, about = "BSMI allocation reports and requirement traceability graphs")]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generates the BSMI allocation report as an Excel workbook
    #[clap(alias = "xl-report")]
    ExcelReport {
        #[clap(flatten)]
        session: SessionArgs,

        #[clap(flatten)]
        allocation: AllocationArgs,

        /// The path to the report file. Supported extensions are '.xlsx', '.xlsm', '.xltx' and '.xltm'
        #[clap(long, short = 'o', default_value = "bsmi-report.xlsx")]
        output_report: PathBuf,
    },

    /// Generates the BSMI allocation report as an HTML page
    HtmlReport {
        #[clap(flatten)]
        session: SessionArgs,

        #[clap(flatten)]
        allocation: AllocationArgs,

        /// The path to the report file. Supported extensions are '.html' and '.htm'
        #[clap(long, short = 'o', default_value = "bsmi-report.html")]
        output_report: PathBuf,
    },

    /// Generates the BSMI allocation report as a JSON workbook
    JsonReport {
        #[clap(flatten)]
        session: SessionArgs,

        #[clap(flatten)]
        allocation: AllocationArgs,

        /// The path to the report file. Supported extensions is '.json'
        #[clap(long, short = 'o', default_value = "bsmi-report.json")]
        output_report: PathBuf,
    },

    /// Generates the requirement traceability dot file
    DotReport {
        #[clap(flatten)]
        session: SessionArgs,

        /// Specification short name followed by category short names, e.g. SPEC:CAT1:CAT2
        #[clap(long = "specification", value_name = "SPEC:CAT1:CAT2")]
        specifications: Vec<String>,

        /// The path to the dot file. Supported extensions is '.dot'
        #[clap(long, short = 'o', default_value = "dot-report.dot")]
        output_report: PathBuf,
    },
}

impl Command {
    pub fn session(&self) -> &SessionArgs {
        match self {
            Command::ExcelReport { session, .. }
            | Command::HtmlReport { session, .. }
            | Command::JsonReport { session, .. }
            | Command::DotReport { session, .. } => session,
        }
    }

    pub fn output_report(&self) -> &PathBuf {
        match self {
            Command::ExcelReport { output_report, .. }
            | Command::HtmlReport { output_report, .. }
            | Command::JsonReport { output_report, .. }
            | Command::DotReport { output_report, .. } => output_report,
        }
    }
}

/// Options shared by all commands: where the model comes from and who opens it
#[derive(Args, Debug, Clone)]
pub struct SessionArgs {
    /// Suppress the logo
    #[clap(long)]
    pub no_logo: bool,

    /// Path to a configuration file
    #[clap(long)]
    pub config: Option<PathBuf>,

    /// Remember the connection options in the configuration file
    #[clap(long)]
    pub save_config: bool,

    /// The model snapshot file from which the report is to be generated
    #[clap(long, short = 's')]
    pub data_source: Option<String>,

    /// The username that is used to open the selected data source
    #[clap(long, short = 'u')]
    pub username: Option<String>,

    /// The password that is used to open the selected data source
    #[clap(long, short = 'p')]
    pub password: Option<String>,

    /// The engineering model short name
    #[clap(long, short = 'm')]
    pub model: Option<String>,

    /// The iteration number
    #[clap(long, short = 'i')]
    pub iteration: Option<u32>,

    /// The domain of expertise short name
    #[clap(long, short = 'd', alias = "domainofexpertise")]
    pub domain: Option<String>,

    /// Open the generated report with its default application
    #[clap(long, short = 'a')]
    pub auto_open_report: bool,
}

/// Options of the allocation reports
#[derive(Args, Debug, Clone)]
pub struct AllocationArgs {
    /// The specification the report is generated from. All non-retired
    /// specifications are used when omitted
    #[clap(long)]
    pub source_specification: Option<String>,

    /// The BSMI code given to unallocated requirements
    #[clap(long)]
    pub unallocated_bsmi_code: Option<String>,
}
