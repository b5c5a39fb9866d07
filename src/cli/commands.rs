use crate::project::ProjectKind;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

pub const DEFAULT_TRANSCRIPT: &str = "build_log.txt";
pub const DEFAULT_RECORD: &str = "ai_fixes.json";
pub const DEFAULT_FLAG: &str = "error_type.txt";

/// Classifies failed CI builds and applies automatic fixes
#[derive(Parser, Debug)]
#[command(
    name = "buildmedic",
    about = "Classifies failed CI builds and applies automatic fixes",
    version,
    long_about = "buildmedic reads a build failure transcript, decides whether the failure \
                  is MINOR (automatically fixable) or MAJOR (needs a human), and for MINOR \
                  failures applies targeted line fixes, whitespace normalization, missing \
                  dependency resolution and project scaffolding to the working tree."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(short = 'v', long, global = true, help = "Enable debug logging")]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Quiet mode - suppress non-error output"
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Classify a build failure and remediate it when minor",
        long_about = "Runs the full pipeline: classify the transcript, persist the decision, \
                      and apply fixes when the failure is MINOR.\n\n\
                      Examples:\n  \
                      buildmedic analyze\n  \
                      buildmedic analyze --project python --transcript logs/build.txt\n  \
                      buildmedic analyze --no-remote --format json"
    )]
    Analyze(AnalyzeArgs),

    #[command(
        about = "Classify a build failure without touching the source tree",
        long_about = "Classifies the transcript and persists the decision record and flag \
                      file. No fixes are applied.\n\n\
                      Examples:\n  \
                      buildmedic classify\n  \
                      buildmedic classify --format yaml"
    )]
    Classify(AnalyzeArgs),

    #[command(
        about = "Apply fixes from a previously persisted classification",
        long_about = "Loads the decision record written by `classify` and runs the fix \
                      pipeline against it.\n\n\
                      Examples:\n  \
                      buildmedic fix\n  \
                      buildmedic fix --record out/ai_fixes.json"
    )]
    Fix(FixArgs),

    #[command(about = "Show the effective configuration")]
    Config(ConfigArgs),
}

/// Flags shared by every command that works on a project tree.
#[derive(Args, Debug, Clone)]
pub struct TreeArgs {
    #[arg(
        long,
        value_name = "DIR",
        help = "Project root (defaults to current directory)"
    )]
    pub root: Option<PathBuf>,

    #[arg(
        short = 'p',
        long,
        value_parser = parse_project_kind,
        help = "Project type, overrides PROJECT_TYPE"
    )]
    pub project: Option<ProjectKind>,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,

    #[arg(
        short = 'o',
        long,
        value_name = "FILE",
        help = "Write output to file instead of stdout"
    )]
    pub output: Option<PathBuf>,

    #[arg(
        long,
        value_name = "FILE",
        default_value = DEFAULT_RECORD,
        help = "Classification record, relative to the root"
    )]
    pub record: PathBuf,

    #[arg(
        long,
        value_name = "FILE",
        default_value = DEFAULT_FLAG,
        help = "Flag file holding minor or major, relative to the root"
    )]
    pub flag: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    pub tree: TreeArgs,

    #[arg(
        short = 't',
        long,
        value_name = "FILE",
        default_value = DEFAULT_TRANSCRIPT,
        help = "Build transcript, relative to the root"
    )]
    pub transcript: PathBuf,

    #[arg(
        long,
        value_name = "CHARS",
        help = "Transcript characters sent for remote analysis, overrides MAX_ERROR_LENGTH"
    )]
    pub max_chars: Option<usize>,

    #[arg(long, help = "Skip remote analysis and use pattern matching only")]
    pub no_remote: bool,
}

#[derive(Args, Debug, Clone)]
pub struct FixArgs {
    #[command(flatten)]
    pub tree: TreeArgs,

    #[arg(
        short = 't',
        long,
        value_name = "FILE",
        default_value = DEFAULT_TRANSCRIPT,
        help = "Build transcript used for dependency resolution, relative to the root"
    )]
    pub transcript: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormatArg {
    Json,
    Yaml,
    Human,
}

impl From<OutputFormatArg> for super::output::OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Json => super::output::OutputFormat::Json,
            OutputFormatArg::Yaml => super::output::OutputFormat::Yaml,
            OutputFormatArg::Human => super::output::OutputFormat::Human,
        }
    }
}

fn parse_project_kind(s: &str) -> Result<ProjectKind, String> {
    s.parse()
}
