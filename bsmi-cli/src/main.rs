mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::path::Path;

use bsmi_core::{
    open_provider, resolve_config_path, resolve_partition_arguments, AllocationWarning,
    Credentials, DotFileGenerator, HtmlReportGenerator, Iteration, JsonReportGenerator,
    ModelIndex, ReportGenerator, TabularReportGenerator, ToolConfig, XlsxReportGenerator,
};

use crate::cli::{AllocationArgs, Cli, Command, SessionArgs};

const LOGO: &str = r"
  ____  ____  __  __ ___
 | __ )/ ___||  \/  |_ _|
 |  _ \\___ \| |\/| || |
 | |_) |___) | |  | || |
 |____/|____/|_|  |_|___|  reporting
";

/// Connection parameters after merging command line and configuration
#[derive(Debug)]
struct Session {
    data_source: String,
    username: String,
    password: Option<String>,
    model: String,
    iteration: u32,
    domain: String,
}

impl Session {
    fn resolve(args: &SessionArgs, config: &ToolConfig) -> Result<Self> {
        fn required<T: Clone>(flag: &str, cli: &Option<T>, config: &Option<T>) -> Result<T> {
            cli.clone()
                .or_else(|| config.clone())
                .with_context(|| format!("{} is required (on the command line or in the configuration file)", flag))
        }

        Ok(Self {
            data_source: required("--data-source", &args.data_source, &config.data_source)?,
            username: required("--username", &args.username, &config.username)?,
            password: args.password.clone(),
            model: required("--model", &args.model, &config.model)?,
            iteration: required("--iteration", &args.iteration, &config.iteration)?,
            domain: required("--domain", &args.domain, &config.domain)?,
        })
    }

    /// Writes the connection options to the configuration file, without the password
    fn save(&self, config: &ToolConfig, explicit: Option<&Path>) -> Result<()> {
        let path = resolve_config_path(explicit).context("No location for the configuration file")?;
        config
            .with_session(
                &self.data_source,
                &self.username,
                &self.model,
                self.iteration,
                &self.domain,
            )
            .save(&path)
            .with_context(|| format!("Failed to save configuration to {}", path.display()))?;
        println!("{}", format!(" Configuration saved to {}", path.display()).green());
        Ok(())
    }

    fn open_iteration(&self) -> Result<Iteration> {
        println!("{}", " Connecting to source".green());
        let credentials = Credentials::new(self.username.clone(), self.password.clone());
        let provider = open_provider(&self.data_source, credentials)
            .with_context(|| format!("Failed to open data source {}", self.data_source))?;

        println!("{}", " Reading Iteration data".green());
        let iteration = provider
            .get_iteration(&self.model, self.iteration, &self.domain)
            .with_context(|| format!("Failed to read iteration {} of model {}", self.iteration, self.model))?;
        Ok(iteration)
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::new().filter_or("BSMI_LOG", "warn")).init();

    let cli = Cli::parse();
    let session_args = cli.command.session();

    if !session_args.no_logo {
        println!("{}", LOGO.blue());
    }

    // reject the output path before touching the data source
    let output = cli.command.output_report();
    preflight(generator_for(&cli.command), output)?;

    let config = ToolConfig::discover(session_args.config.as_deref())
        .context("Failed to load configuration")?;
    let session = Session::resolve(session_args, &config)?;
    if session_args.save_config {
        session.save(&config, session_args.config.as_deref())?;
    }

    match &cli.command {
        Command::ExcelReport { allocation, .. } => {
            run_tabular_report(&XlsxReportGenerator::new(), &session, allocation, &config, output)?;
        }
        Command::HtmlReport { allocation, .. } => {
            run_tabular_report(&HtmlReportGenerator::new(), &session, allocation, &config, output)?;
        }
        Command::JsonReport { allocation, .. } => {
            run_tabular_report(&JsonReportGenerator::new(), &session, allocation, &config, output)?;
        }
        Command::DotReport { specifications, .. } => {
            run_dot_report(&session, specifications, output)?;
        }
    }

    if session_args.auto_open_report {
        open_report(output);
    }

    Ok(())
}

fn generator_for(command: &Command) -> &'static dyn ReportGenerator {
    match command {
        Command::ExcelReport { .. } => &XlsxReportGenerator,
        Command::HtmlReport { .. } => &HtmlReportGenerator,
        Command::JsonReport { .. } => &JsonReportGenerator,
        Command::DotReport { .. } => &DotFileGenerator,
    }
}

fn preflight(generator: &dyn ReportGenerator, output: &Path) -> Result<()> {
    let (supported, message) = generator.is_supported_output_extension(output);
    if !supported {
        println!();
        println!("{}", message.red());
        println!();
        anyhow::bail!("Unsupported {} output file: {}", generator.report_kind(), output.display());
    }
    Ok(())
}

fn print_parameters(session: &Session, extra: &[(&str, String)], output: &Path) {
    println!("{}", "Initializing report parameters...".yellow());
    println!();
    println!("{}", format!(" --username: {}", session.username).green());
    println!("{}", format!(" --data-source: {}", session.data_source).green());
    println!("{}", format!(" --model: {}", session.model).green());
    println!("{}", format!(" --iteration: {}", session.iteration).green());
    println!("{}", format!(" --domain: {}", session.domain).green());
    for (flag, value) in extra {
        println!("{}", format!(" --{}: {}", flag, value).green());
    }
    println!("{}", format!(" --output-report: {}", output.display()).green());
    println!();
}

fn run_tabular_report(
    generator: &dyn TabularReportGenerator,
    session: &Session,
    allocation: &AllocationArgs,
    config: &ToolConfig,
    output: &Path,
) -> Result<()> {
    let mut settings = config.report_settings();
    if let Some(code) = &allocation.unallocated_bsmi_code {
        settings.unallocated_code = code.clone();
    }

    print_parameters(
        session,
        &[
            (
                "source-specification",
                allocation.source_specification.clone().unwrap_or_else(|| "<all>".to_string()),
            ),
            ("unallocated-bsmi-code", settings.unallocated_code.clone()),
        ],
        output,
    );

    let iteration = session.open_iteration()?;
    let index = ModelIndex::build(&iteration).context("The iteration is not consistent")?;

    let specifications = index.select_specifications(allocation.source_specification.as_deref());

    println!("{}", " Generating Report".green());
    let warnings = generator
        .generate(&index, &specifications, &settings, output)
        .with_context(|| report_failure(output))?;

    print_warnings(&warnings);
    print_generated(generator.report_kind(), output);
    Ok(())
}

fn run_dot_report(session: &Session, specifications: &[String], output: &Path) -> Result<()> {
    let extra: Vec<(&str, String)> = specifications
        .iter()
        .map(|s| ("specification", s.clone()))
        .collect();
    print_parameters(session, &extra, output);

    let iteration = session.open_iteration()?;
    let index = ModelIndex::build(&iteration).context("The iteration is not consistent")?;

    println!("{}", " Generating Report".green());
    let partitions = resolve_partition_arguments(&index, specifications)?;
    let generator = DotFileGenerator::new();
    let document = generator
        .generate(&index, partitions, output)
        .with_context(|| report_failure(output))?;

    log::debug!(
        "dot file has {} nodes and {} edges",
        document.nodes().count(),
        document.edges.len()
    );
    print_generated(generator.report_kind(), output);
    Ok(())
}

fn report_failure(output: &Path) -> String {
    format!(
        "The report file {} could not be generated. Make sure the file is not open and try again",
        output.display()
    )
}

fn print_warnings(warnings: &[AllocationWarning]) {
    if warnings.is_empty() {
        return;
    }
    println!("{}", format!(" {} allocation warnings:", warnings.len()).yellow());
    for warning in warnings {
        println!("   {}", warning.to_string().yellow());
    }
}

fn print_generated(kind: &str, output: &Path) {
    println!(
        "{} Requirement {} report generated at {}",
        "LOG:".dimmed(),
        kind,
        output.display().to_string().bold()
    );
    println!();
}

fn open_report(output: &Path) {
    println!("Opening generated report");
    match open::that(output) {
        Ok(()) => println!("Generated report opened"),
        Err(e) => {
            log::warn!("could not open {}: {}", output.display(), e);
            println!("{}", "Opening of generated report failed, please open manually".red());
        }
    }
}
