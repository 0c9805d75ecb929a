mod cli_args;

use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use log;
use std::io;
use std::path::Path;
use std::process;

use cli_args::{Cli, SelectionOpts};
use codebundle_core::{AppError, Config, SelectOverrides, aggregate_with, write_bundle};

fn main() {
    let cli_args = Cli::parse();

    setup_logging(cli_args.quiet, cli_args.verbose);
    let quiet = cli_args.quiet;

    log::debug!("CLI args parsed: {:?}", cli_args);

    let exit_code = match run_app(cli_args, quiet) {
        Ok(_) => {
            log::info!("Application finished successfully.");
            0
        }
        Err(e) => {
            let exit_code = exit_code_for(&e);
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            exit_code
        }
    };
    log::debug!("Exiting with code {}", exit_code);
    process::exit(exit_code);
}

fn exit_code_for(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<AppError>() {
        Some(AppError::Config(_)) => 1,
        Some(AppError::TomlParse(_)) => 1,
        Some(AppError::Io(_)) => 2,
        Some(AppError::FileRead { .. }) => 2,
        Some(AppError::FileWrite { .. }) => 2,
        Some(AppError::Walk(_)) => 2,
        Some(AppError::InvalidRoot { .. }) => 3, // Nothing was written
        Some(AppError::InvalidArgument(_)) => 5,
        Some(_) => 1, // Default exit code for other core AppErrors
        None => 1,    // Plain anyhow errors
    }
}

fn setup_logging(quiet: bool, verbose: u8) {
    let log_level = if quiet {
        log::LevelFilter::Off // Errors still reach stderr through main
    } else {
        match verbose {
            0 => log::LevelFilter::Warn,  // Default: warnings and errors
            1 => log::LevelFilter::Info,  // -v: start/finish of the run
            2 => log::LevelFilter::Debug, // -vv: every bundled file
            _ => log::LevelFilter::Trace, // -vvv+: every walked entry
        }
    };
    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp(None) // Keep logs clean
        .init();
    log::trace!("Logger initialized with level: {:?}", log_level);
}

// An empty flag list means "not given", so the configured list stays
fn selection_overrides(opts: &SelectionOpts) -> SelectOverrides {
    let non_empty = |values: &Vec<String>| (!values.is_empty()).then(|| values.clone());
    SelectOverrides {
        extensions: non_empty(&opts.extensions),
        exclude_files: non_empty(&opts.exclude_files),
        exclude_dirs: non_empty(&opts.exclude_dirs),
    }
}

fn load_config(cli: &Cli) -> Result<Config> {
    let root = Config::expand_path(&cli.root);
    let config_path = Config::resolve_config_path(
        &root,
        cli.config_file.config.as_ref(),
        cli.config_file.no_config,
    )
    .context("Failed to resolve configuration path")?;

    let config = match &config_path {
        Some(path) => Config::load_from_path(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::default(),
    };
    Ok(config.apply_overrides(selection_overrides(&cli.selection)))
}

fn run_app(cli: Cli, quiet: bool) -> Result<()> {
    let config = load_config(&cli)?;
    log::debug!("Effective config: {:?}", config);

    let filter = config.file_filter()?;
    let classifier = config.classifier();
    let root = Config::expand_path(&cli.root);

    if cli.writes_to_stdout() {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        let stats = write_bundle(
            &root,
            &mut handle,
            Path::new("<stdout>"),
            &filter,
            &classifier,
        )?;
        log::info!("Bundled {} files to standard output", stats.files);
        return Ok(());
    }

    let output = Config::expand_path(&cli.output);
    let stats = aggregate_with(&root, &output, &filter, &classifier)?;
    if !quiet {
        println!(
            "{} Bundled {} files into {}",
            "✅".green(),
            stats.files,
            output.display().to_string().blue()
        );
    }
    Ok(())
}
