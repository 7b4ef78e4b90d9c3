// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! modbridge - convert JavaScript modules between ESM and CommonJS
//!
//! This is the main entry point for the modbridge CLI.
//!
//! ## Features
//!
//! - ESM to CommonJS and CommonJS to ESM conversion
//! - Automatic direction detection
//! - Node.js-style specifier resolution, optionally into a build tree
//! - Dependency listing, direct or transitive

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use modbridge_node::module_system::{BuildContext, ModuleType, Origin};
use modbridge_node::{
    Config, ImportResolver, MirrorBuild, ResolveScope, SpecifierResolver, StaticExportInspector,
    TransformOutput, VERSION, scan_dependencies, to_commonjs, to_esm, walk_dependencies,
};
use owo_colors::OwoColorize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "modbridge",
    about = "Convert JavaScript modules between ESM and CommonJS",
    version = VERSION,
    author = "Pegasus Heavy Industries"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Configuration file (defaults to ./modbridge.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Source root of the build
    #[arg(long, global = true)]
    entry: Option<PathBuf>,

    /// Build output root mirroring --entry
    #[arg(long, global = true)]
    build_dir: Option<PathBuf>,

    /// Write output here instead of stdout (a directory for several files)
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Convert ES modules to CommonJS
    ToCjs {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Convert CommonJS modules to ES modules
    ToEsm {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Convert each file to the other module style
    Convert {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// List the dependencies of a file
    Deps {
        file: PathBuf,

        /// Follow dependencies transitively
        #[arg(long)]
        all: bool,

        /// Print resolutions as JSON
        #[arg(long)]
        json: bool,
    },
    /// Resolve a single specifier
    Resolve {
        specifier: String,

        /// Directory to resolve from
        #[arg(long, default_value = ".")]
        from: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    ToCommonJs,
    ToEsm,
    Auto,
}

/// Main entry point - uses tokio runtime for async operations.
#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref());

    let level = if cli.verbose {
        "debug".to_string()
    } else {
        config
            .as_ref()
            .map(|config| config.log_level.clone())
            .unwrap_or_else(|_| "warn".to_string())
    };
    init_logging(&level);

    let result = match config {
        Ok(config) => run(cli, config).await,
        Err(e) => Err(anyhow::Error::from(e).context("loading configuration")),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}: {:#}", "Error".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "modbridge={level},modbridge_node={level},modbridge_lexer={level}"
        ))
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli, mut config: Config) -> anyhow::Result<()> {
    if let Some(entry) = cli.entry {
        config.entry = Some(entry);
    }
    if let Some(build_dir) = cli.build_dir {
        config.build_dir = Some(build_dir);
    }
    debug!(?config, "configuration");

    let resolver = ImportResolver::new(&config.packages_dir);
    let build = match config.build_roots() {
        Some((entry, build_dir)) => Some(MirrorBuild::new(
            std::path::absolute(entry)?,
            std::path::absolute(build_dir)?,
        )),
        None => None,
    };
    let scope = ResolveScope::new(&resolver, build.as_ref().map(|b| b as &dyn BuildContext));
    let output = cli.output.as_deref();

    match cli.command {
        Command::ToCjs { files } => convert_files(&files, Direction::ToCommonJs, &scope, output).await,
        Command::ToEsm { files } => convert_files(&files, Direction::ToEsm, &scope, output).await,
        Command::Convert { files } => convert_files(&files, Direction::Auto, &scope, output).await,
        Command::Deps { file, all, json } => {
            list_dependencies(&file, all, json, &scope, config.large_file_threshold).await
        }
        Command::Resolve { specifier, from } => {
            let resolution = scope.resolve_specifier(&from, &specifier).await;
            println!("{}", serde_json::to_string_pretty(&resolution)?);
            Ok(())
        }
    }
}

async fn convert_files(
    files: &[PathBuf],
    direction: Direction,
    scope: &ResolveScope<'_>,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let results =
        futures::future::join_all(files.iter().map(|file| convert_file(file, direction, scope))).await;

    for (file, result) in files.iter().zip(results) {
        let converted = result?;
        report(file, &converted);

        match output {
            Some(out) if files.len() > 1 => {
                tokio::fs::create_dir_all(out).await?;
                let name = file
                    .file_name()
                    .with_context(|| format!("{} has no file name", file.display()))?;
                let target = out.join(name);
                tokio::fs::write(&target, &converted.code)
                    .await
                    .with_context(|| format!("writing {}", target.display()))?;
            }
            Some(out) => tokio::fs::write(out, &converted.code)
                .await
                .with_context(|| format!("writing {}", out.display()))?,
            None => print!("{}", converted.code),
        }
    }

    Ok(())
}

async fn convert_file(
    file: &Path,
    direction: Direction,
    scope: &ResolveScope<'_>,
) -> anyhow::Result<TransformOutput> {
    let path = std::path::absolute(file)?;
    let source = tokio::fs::read_to_string(&path)
        .await
        .with_context(|| format!("reading {}", file.display()))?;

    let to_cjs = match direction {
        Direction::ToCommonJs => true,
        Direction::ToEsm => false,
        Direction::Auto => match ModuleType::detect(&path, &source) {
            ModuleType::ESM => true,
            ModuleType::CommonJS | ModuleType::Unknown => false,
            ModuleType::Json => bail!("{} is JSON, nothing to convert", file.display()),
        },
    };
    debug!(file = %file.display(), to_cjs, "converting");

    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    Ok(if to_cjs {
        to_commonjs(&source, base_dir, scope).await
    } else {
        to_esm(&source, &path, scope, &StaticExportInspector).await
    })
}

fn report(file: &Path, converted: &TransformOutput) {
    for skipped in &converted.diagnostics.skipped {
        eprintln!(
            "{}: {}:{}: `{}` statement not recognized, left as written",
            "warning".yellow().bold(),
            file.display(),
            skipped.line,
            skipped.keyword
        );
    }
    for specifier in &converted.diagnostics.unresolved {
        eprintln!(
            "{}: {}: could not resolve '{}'",
            "warning".yellow().bold(),
            file.display(),
            specifier
        );
    }
}

async fn list_dependencies(
    file: &Path,
    all: bool,
    json: bool,
    scope: &ResolveScope<'_>,
    threshold: usize,
) -> anyhow::Result<()> {
    let path = std::path::absolute(file)?;

    if all {
        let files = walk_dependencies(&path, scope, threshold)
            .await
            .with_context(|| format!("walking {}", file.display()))?;
        if json {
            println!("{}", serde_json::to_string_pretty(&files)?);
        } else {
            for found in files {
                println!("{}", found.display());
            }
        }
        return Ok(());
    }

    let source = tokio::fs::read_to_string(&path)
        .await
        .with_context(|| format!("reading {}", file.display()))?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));

    let mut resolutions = Vec::new();
    for specifier in scan_dependencies(&source, threshold) {
        resolutions.push((specifier.clone(), scope.resolve_specifier(base_dir, &specifier).await));
    }

    if json {
        let list: Vec<_> = resolutions.iter().map(|(_, resolution)| resolution).collect();
        println!("{}", serde_json::to_string_pretty(&list)?);
        return Ok(());
    }

    for (specifier, resolution) in resolutions {
        let origin = match resolution.origin {
            Origin::Core => "core".cyan().to_string(),
            Origin::Local => "local".green().to_string(),
            Origin::Package => "package".blue().to_string(),
            Origin::Unresolved => "unresolved".red().to_string(),
        };
        println!("{specifier} -> {} ({origin})", resolution.path.display());
    }
    Ok(())
}
