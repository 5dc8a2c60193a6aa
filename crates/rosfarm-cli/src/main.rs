//! rosfarm - CI build orchestration for mixed catkin/rosbuild workspaces.
//!
//! The `rosfarm` command is the per-job entry point the CI server runs on
//! its build slaves.
//!
//! ## Commands
//!
//! - `build`: resolve, install and build one pipeline repository
//! - `check-config`: load a pipeline configuration and list its entries

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rosfarm_build::pipeline;
use rosfarm_core::{BuildContext, BuildIdentifier, PipelineConfig, SystemRunner};
use std::path::{Path, PathBuf};
use tracing::{error, info, Level};

#[derive(Parser)]
#[command(name = "rosfarm")]
#[command(author = "Rosfarm Developers")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "CI build orchestration for mixed catkin/rosbuild workspaces", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve, install and build one pipeline repository
    Build {
        /// Owner of the pipeline configuration repository
        pipeline_repos_owner: String,

        /// CI server the configuration is filed under
        server_name: String,

        /// CI user the configuration belongs to
        user_name: String,

        /// Target ROS distribution release tag
        ros_distro: String,

        /// Build identifier of the form repository[__suffix]
        build_identifier: String,

        /// CI job workspace directory
        #[arg(long, env = "WORKSPACE")]
        workspace: PathBuf,

        /// Search path for legacy packages
        #[arg(long, env = "ROS_PACKAGE_PATH", default_value = "")]
        ros_package_path: String,

        /// Read the pipeline configuration from a local file instead of the
        /// configuration repository
        #[arg(long)]
        config_file: Option<PathBuf>,
    },

    /// Load a pipeline configuration and list its repositories
    CheckConfig {
        /// Owner of the pipeline configuration repository
        #[arg(required_unless_present = "config_file")]
        pipeline_repos_owner: Option<String>,

        /// CI server the configuration is filed under
        #[arg(required_unless_present = "config_file")]
        server_name: Option<String>,

        /// CI user the configuration belongs to
        #[arg(required_unless_present = "config_file")]
        user_name: Option<String>,

        /// Read the configuration from a local file
        #[arg(long)]
        config_file: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    rosfarm_core::init_tracing(cli.json, level);

    if let Err(e) = run(cli) {
        error!("{:#}", e);
        eprintln!("Build script failed!");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Build {
            pipeline_repos_owner,
            server_name,
            user_name,
            ros_distro,
            build_identifier,
            workspace,
            ros_package_path,
            config_file,
        } => cmd_build(
            &pipeline_repos_owner,
            &server_name,
            &user_name,
            &ros_distro,
            &build_identifier,
            workspace,
            ros_package_path,
            config_file.as_deref(),
        ),
        Commands::CheckConfig {
            pipeline_repos_owner,
            server_name,
            user_name,
            config_file,
        } => {
            let config = load_config(
                config_file.as_deref(),
                pipeline_repos_owner.as_deref(),
                server_name.as_deref(),
                user_name.as_deref(),
            )?;
            cmd_check_config(&config, cli.json)
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn cmd_build(
    pipeline_repos_owner: &str,
    server_name: &str,
    user_name: &str,
    ros_distro: &str,
    build_identifier: &str,
    workspace: PathBuf,
    ros_package_path: String,
    config_file: Option<&Path>,
) -> Result<()> {
    let config = load_config(
        config_file,
        Some(pipeline_repos_owner),
        Some(server_name),
        Some(user_name),
    )?;
    info!("pipeline configuration successfully loaded");

    let identifier = BuildIdentifier::parse(build_identifier);
    let ctx = BuildContext::new(workspace, ros_distro, ros_package_path);

    let report = pipeline::run(&ctx, &config, &identifier, &SystemRunner)
        .with_context(|| format!("build of {} failed", identifier))?;

    info!(
        family = %report.family,
        overrides = report.fulfilled_overrides.len(),
        system_packages = report.system_installed.len(),
        "pipeline run complete"
    );
    println!("Build script finished cleanly!");
    Ok(())
}

fn cmd_check_config(config: &PipelineConfig, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(config)?);
        return Ok(());
    }

    println!(
        "Pipeline configuration for {} on {}",
        config.user_name, config.server_name
    );
    for (identifier, entry) in &config.repositories {
        println!(
            "  {}  {} @ {}",
            identifier,
            entry.url,
            entry.version.as_deref().unwrap_or("default")
        );
        for (name, pin) in &entry.dependencies {
            println!(
                "    override {}  {} @ {}",
                name,
                pin.url,
                pin.version.as_deref().unwrap_or("default")
            );
        }
    }
    Ok(())
}

fn load_config(
    config_file: Option<&Path>,
    owner: Option<&str>,
    server_name: Option<&str>,
    user_name: Option<&str>,
) -> Result<PipelineConfig> {
    match config_file {
        Some(path) => PipelineConfig::load_from_file(path)
            .with_context(|| format!("failed to load pipeline configuration from {}", path.display())),
        None => {
            let owner = owner.context("missing pipeline configuration owner")?;
            let server_name = server_name.context("missing CI server name")?;
            let user_name = user_name.context("missing CI user name")?;
            PipelineConfig::load_from_url(owner, server_name, user_name)
                .context("failed to load pipeline configuration from the configuration repository")
        }
    }
}
