use clap::{Args, Parser};
use std::path::PathBuf;

#[derive(Args, Debug, Clone, Default)]
pub struct ConfigFileOpts {
    #[arg(
        long,
        help = "Path of the TOML config file (default: <ROOT>/.codebundle.toml).",
        value_name = "CONFIG_FILE",
        conflicts_with = "no_config",
        help_heading = "Configuration"
    )]
    pub config: Option<PathBuf>,

    #[arg(
        long,
        help = "Disable loading any TOML config file.",
        conflicts_with = "config",
        help_heading = "Configuration"
    )]
    pub no_config: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct SelectionOpts {
    #[arg(
        short = 'e',
        long = "ext",
        value_name = "EXT",
        value_delimiter = ',',
        help = "File extensions to include, without the dot (repeatable or comma-separated).",
        help_heading = "Selection"
    )]
    pub extensions: Vec<String>,

    #[arg(
        short = 'x',
        long = "exclude-file",
        value_name = "NAME",
        value_delimiter = ',',
        help = "Exact file names to skip (replaces the configured list).",
        help_heading = "Selection"
    )]
    pub exclude_files: Vec<String>,

    #[arg(
        short = 'd',
        long = "exclude-dir",
        value_name = "NAME",
        value_delimiter = ',',
        help = "Exact directory names whose subtrees are skipped.",
        help_heading = "Selection"
    )]
    pub exclude_dirs: Vec<String>,
}

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Bundle a project's source files into one markdown/text document.",
    long_about = "codebundle walks ROOT, keeps files whose extension is allowed, and writes each one \nto OUTPUT as a file name line followed by a fenced code block tagged with its language.",
    help_template = "{about-section}\nUsage: {usage}\n\n{all-args}{after-help}",
    after_help = "EXAMPLES:\n  codebundle . bundle.md -e rs,toml -d target\n  codebundle src - -e py -x __init__.py",
    arg_required_else_help = true
)]
pub struct Cli {
    #[arg(value_name = "ROOT", help = "Directory to walk.")]
    pub root: PathBuf,

    #[arg(value_name = "OUTPUT", help = "File to write, or '-' for standard output.")]
    pub output: PathBuf,

    #[clap(flatten)]
    pub selection: SelectionOpts,

    #[clap(flatten)]
    pub config_file: ConfigFileOpts,

    #[arg(short, long, action = clap::ArgAction::Count, help = "Increase message verbosity (-v, -vv).")]
    pub verbose: u8,

    #[arg(short, long, help = "Silence informational messages and warnings.")]
    pub quiet: bool,
}

impl Cli {
    pub fn writes_to_stdout(&self) -> bool {
        self.output.as_os_str() == "-"
    }
}
