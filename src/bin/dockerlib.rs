//! dockerlib CLI - regenerate official-images library descriptors
//!
//! Commands: update, refresh
//! Outputs a JSON report to stdout, logs to stderr
//! Returns non-zero if any manifest fails

use clap::{Args, Parser, Subcommand};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use dockerlib::compiler::{GIT_COMMIT, GIT_REPO};
use dockerlib::header::MAINTAINERS;
use dockerlib::{
    write_descriptor, write_if_changed, Config, DescriptorCompiler, DirectoryLister,
    DockerfileResolver, FlatManifest, GitCli, Header, ImageManifest, IncrementalCompiler, LocalFs,
    Result, RevisionMap, RevisionOracle, TOOL_VERSION,
};

#[derive(Parser)]
#[command(name = "dockerlib")]
#[command(about = "Manage docker official images")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to configuration file (default: ./dockerlib.toml if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Regenerate descriptors from hierarchical manifests
    Update(PathArgs),

    /// Regenerate descriptors from flat manifests, keeping revisions of unchanged directories
    Refresh(PathArgs),
}

#[derive(Args)]
struct PathArgs {
    /// Directory searched for manifest.json files
    #[arg(short, long)]
    root: Option<PathBuf>,

    /// Directory descriptors are written to
    #[arg(short, long)]
    library_dir: Option<PathBuf>,
}

impl PathArgs {
    fn apply(&self, config: &mut Config) {
        if let Some(root) = &self.root {
            config.search_root = root.clone();
        }
        if let Some(dir) = &self.library_dir {
            config.library_dir = dir.clone();
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let directive = if cli.debug { "dockerlib=debug" } else { "dockerlib=info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut config = match Config::load(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            let error = format!("Failed to load config: {}", e);
            println!("{}", json!({ "success": false, "error": error }));
            return ExitCode::FAILURE;
        }
    };

    let result = match &cli.command {
        Commands::Update(args) => {
            args.apply(&mut config);
            update(&config)
        }
        Commands::Refresh(args) => {
            args.apply(&mut config);
            refresh(&config)
        }
    };

    match result {
        Ok(images) => {
            let output = json!({
                "success": true,
                "tool_version": TOOL_VERSION,
                "images": images,
            });
            let text = serde_json::to_string_pretty(&output).unwrap_or_else(|_| output.to_string());
            println!("{}", text);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            println!("{}", json!({ "success": false, "error": e.to_string() }));
            ExitCode::FAILURE
        }
    }
}

fn update(config: &Config) -> Result<Vec<Value>> {
    let git = GitCli::new(".");
    let compiler = DescriptorCompiler::new(&DockerfileResolver);

    let mut images = vec![];
    for path in LocalFs.find_manifests(&config.search_root)? {
        let mut manifest = ImageManifest::read(&path)?;
        info!(image = %manifest.name, manifest = %path.display(), "updating image");
        if manifest.maintainers.is_empty() {
            manifest.maintainers = config.default_maintainers.clone();
        }

        let mut header = Header::new();
        for maintainer in &manifest.maintainers {
            header.add(MAINTAINERS, maintainer.as_str());
        }
        header.add(GIT_REPO, config.git_repo.as_str());
        header.add(GIT_COMMIT, git.latest_revision(&manifest.base_dir)?);

        let mut buf = Vec::new();
        let blocks = compiler.write(&mut buf, &manifest, Some(&header))?;
        images.push(report(config, &manifest.name, blocks, &buf)?);
    }
    Ok(images)
}

fn refresh(config: &Config) -> Result<Vec<Value>> {
    let git = GitCli::new(".");
    let compiler =
        IncrementalCompiler::new(&DockerfileResolver, &git, &LocalFs, config.git_repo.as_str());

    let mut images = vec![];
    for path in LocalFs.find_manifests(&config.search_root)? {
        let manifest = FlatManifest::read(&path)?;
        info!(image = %manifest.name, manifest = %path.display(), "refreshing image");

        let mut revisions = RevisionMap::load(&config.descriptor_path(&manifest.name))?;
        let blocks = compiler.compile(&manifest, &mut revisions)?;
        let prefix =
            IncrementalCompiler::prefix(&manifest, &revisions, &config.default_maintainers);

        let mut buf = Vec::new();
        write_descriptor(&mut buf, Some(&prefix), &blocks)?;
        images.push(report(config, &manifest.name, blocks.len(), &buf)?);
    }
    Ok(images)
}

fn report(config: &Config, image: &str, blocks: usize, content: &[u8]) -> Result<Value> {
    let path = config.descriptor_path(image);
    let changed = write_if_changed(&path, content)?;
    Ok(json!({
        "image": image,
        "path": path.display().to_string(),
        "blocks": blocks,
        "changed": changed,
    }))
}
