//! draftsmith - propose repository changes from a natural-language task

mod cli;

use anstream::eprintln;
use clap::{Parser, Subcommand, ValueEnum};
use cli::context::RepoArgs;
use cli::style::Stylize;
use draftsmith::error::Result;
use draftsmith::types::Platform;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Turn a task into a branch, commits and a review request
#[derive(Parser)]
#[command(name = "draftsmith", version)]
struct Cli {
    /// Target repository (`owner/repo` or remote URL)
    #[arg(long, global = true)]
    repo: Option<String>,

    /// Platform, when it cannot be detected from the host
    #[arg(long, global = true, value_enum)]
    platform: Option<PlatformArg>,

    /// Self-hosted GitHub Enterprise or GitLab host
    #[arg(long, global = true)]
    host: Option<String>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum PlatformArg {
    Github,
    Gitlab,
}

impl From<PlatformArg> for Platform {
    fn from(arg: PlatformArg) -> Self {
        match arg {
            PlatformArg::Github => Self::GitHub,
            PlatformArg::Gitlab => Self::GitLab,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Ask the model for a change plan and print it as JSON
    Plan {
        /// What to change, in plain language
        task: String,
        /// Base branch to read the tree from
        #[arg(long)]
        base: Option<String>,
        /// Do not send the repository tree to the model
        #[arg(long)]
        no_tree: bool,
    },
    /// Execute a plan file (or raw model output) against the repository
    Apply {
        /// Plan file, or `-` for stdin
        file: String,
        /// Base branch for the working branch and review
        #[arg(long)]
        base: Option<String>,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Generate a plan for a task and execute it
    Run {
        /// What to change, in plain language
        task: String,
        /// Base branch for the working branch and review
        #[arg(long)]
        base: Option<String>,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
        /// Show the plan without touching the remote
        #[arg(long)]
        dry_run: bool,
    },
    /// List files on a branch
    Tree {
        /// Branch to list (defaults to the base branch)
        #[arg(long)]
        base: Option<String>,
    },
    /// Print a file from the repository
    Show {
        /// Repository-relative path
        path: String,
        /// Branch to read from (defaults to the base branch)
        #[arg(long = "ref")]
        git_ref: Option<String>,
    },
    /// Trigger the configured preview deploy hook
    Deploy,
    /// Authentication management
    Auth {
        #[command(subcommand)]
        action: AuthAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum AuthAction {
    /// Verify the host token works
    Test,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the config file location
    Path,
    /// Print the effective configuration
    Show,
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("warn,draftsmith=debug"),
        _ => EnvFilter::new("debug,draftsmith=trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!(
                "{}: {error}",
                format!("error[{}]", error.kind()).failure()
            );
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let repo = RepoArgs {
        repo: cli.repo,
        platform: cli.platform.map(Platform::from),
        host: cli.host,
    };

    match cli.command {
        Commands::Plan {
            task,
            base,
            no_tree,
        } => cli::plan::run_plan(&repo, &task, cli::plan::PlanOptions { base, no_tree }).await,
        Commands::Apply { file, base, yes } => {
            cli::apply::run_apply(&repo, &file, cli::apply::ApplyOptions { base, yes }).await
        }
        Commands::Run {
            task,
            base,
            yes,
            dry_run,
        } => {
            cli::apply::run_run(
                &repo,
                &task,
                cli::apply::RunOptions { base, yes, dry_run },
            )
            .await
        }
        Commands::Tree { base } => cli::inspect::run_tree(&repo, base.as_deref()).await,
        Commands::Show { path, git_ref } => {
            cli::inspect::run_show(&repo, &path, git_ref.as_deref()).await
        }
        Commands::Deploy => cli::deploy::run_deploy().await,
        Commands::Auth {
            action: AuthAction::Test,
        } => cli::auth::run_auth_test(&repo).await,
        Commands::Config { action } => match action {
            ConfigAction::Path => cli::config::run_config_path(),
            ConfigAction::Show => cli::config::run_config_show(),
        },
    }
}
