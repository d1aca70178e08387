use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use costsheet_tools::boundary::{self, ToolRequest};
use costsheet_tools::classify::{
    self, ClassificationRequest, ColumnClassifier, KeywordClassifier, MappingClassifier,
};
use costsheet_tools::config::PipelineConfig;
use costsheet_tools::io::{discover, excel_read};
use costsheet_tools::{Result, ToolError, merge, pipeline};
use serde_json::json;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    if let Err(error) = init_tracing().and_then(|()| run(cli)) {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| ToolError::Logging(err.to_string()))
}

fn run(cli: Cli) -> Result<()> {
    let config = cli.config.resolve()?;
    match cli.command {
        Command::Run(args) => execute_run(&config, args),
        Command::Merge => {
            let outcome = merge::merge_normalized_spreadsheets(&config)?;
            println!("{}", outcome.describe());
            Ok(())
        }
        Command::Classify(args) => execute_classify(args),
        Command::Tool(args) => execute_tool(&config, args),
    }
}

fn execute_run(config: &PipelineConfig, args: RunArgs) -> Result<()> {
    let classifier = load_classifier(args.mapping.as_ref())?;
    let report = pipeline::run(config, classifier.as_ref())?;
    for file in &report.files {
        println!("{}: {}", file.file.display(), file.status);
    }
    println!("{}", report.merge_status());
    Ok(())
}

fn execute_classify(args: ClassifyArgs) -> Result<()> {
    if !args.input.exists() {
        return Err(ToolError::MissingInput(args.input));
    }
    let classifier = load_classifier(args.mapping.as_ref())?;
    let sheet = excel_read::read_spreadsheet(&args.input)?;
    let request = ClassificationRequest::from_sheet(discover::base_name(&args.input), &sheet);

    let cost = classify::classify_cost_columns(classifier.as_ref(), &request)
        .map(|columns| json!(columns))
        .unwrap_or_else(|err| json!({ "error": err.to_string() }));
    let roles = classify::classify_roles(classifier.as_ref(), &request)
        .map(|roles| json!(roles))
        .unwrap_or_else(|err| json!({ "error": err.to_string() }));

    let output = json!({ "request": request, "cost_columns": cost, "roles": roles });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn execute_tool(config: &PipelineConfig, args: ToolArgs) -> Result<()> {
    let request = ToolRequest::from_json(&args.request)?;
    let status = match args.name {
        ToolName::NormalizeSpreadsheets => boundary::normalize_spreadsheets(config, &request),
        ToolName::NormalizeCpf => boundary::normalize_cpf(config, &request),
        ToolName::NormalizeText => boundary::normalize_text(config, &request),
        ToolName::NormalizeMonetaryValues => boundary::normalize_monetary_values(config, &request),
        ToolName::Merge => boundary::merge(config),
    };
    println!("{status}");
    Ok(())
}

fn load_classifier(mapping: Option<&PathBuf>) -> Result<Box<dyn ColumnClassifier>> {
    Ok(match mapping {
        Some(path) => Box::new(MappingClassifier::load(path)?),
        None => Box::new(KeywordClassifier::new()),
    })
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Normalize employee benefit cost spreadsheets and merge them into one report."
)]
struct Cli {
    #[command(flatten)]
    config: ConfigArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Rename, clean, and merge every spreadsheet of the input directory.
    Run(RunArgs),
    /// Merge the normalized spreadsheets already in the output directory.
    Merge,
    /// Show how a spreadsheet's columns would be classified.
    Classify(ClassifyArgs),
    /// Invoke a single tool with a JSON request and print its status line.
    Tool(ToolArgs),
}

#[derive(clap::Args)]
struct ConfigArgs {
    /// JSON configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory scanned for raw cost spreadsheets.
    #[arg(long, global = true)]
    input_dir: Option<PathBuf>,

    /// Directory receiving normalized files and the merged report.
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,

    /// File name of the base employee spreadsheet.
    #[arg(long, global = true)]
    base_file: Option<String>,

    /// File name of the merged report.
    #[arg(long, global = true)]
    merged_file: Option<String>,
}

impl ConfigArgs {
    fn resolve(&self) -> Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) if !path.exists() => return Err(ToolError::MissingInput(path.clone())),
            Some(path) => PipelineConfig::load(path)?,
            None => PipelineConfig::default(),
        };
        if let Some(dir) = &self.input_dir {
            config.input_directory = dir.clone();
        }
        if let Some(dir) = &self.output_dir {
            config.output_directory = dir.clone();
        }
        if let Some(name) = &self.base_file {
            config.base_file_name = name.clone();
        }
        if let Some(name) = &self.merged_file {
            config.merged_file_name = name.clone();
        }
        Ok(config)
    }
}

#[derive(clap::Args)]
struct RunArgs {
    /// JSON column mapping used instead of the keyword classifier.
    #[arg(long)]
    mapping: Option<PathBuf>,
}

#[derive(clap::Args)]
struct ClassifyArgs {
    /// Spreadsheet to inspect.
    #[arg(long)]
    input: PathBuf,

    /// JSON column mapping used instead of the keyword classifier.
    #[arg(long)]
    mapping: Option<PathBuf>,
}

#[derive(clap::Args)]
struct ToolArgs {
    /// Tool to invoke.
    #[arg(value_enum)]
    name: ToolName,

    /// Request as JSON, e.g. '{"file_name": "a.xlsx", "columns": ["CPF"]}'.
    #[arg(long, default_value = "{}")]
    request: String,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ToolName {
    NormalizeSpreadsheets,
    NormalizeCpf,
    NormalizeText,
    NormalizeMonetaryValues,
    Merge,
}
