use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "nest",
    about = "Nest trip planner against an in-process mock backend",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// TOML client config
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Where the session snapshot lives (default: .nest)
    #[arg(long, global = true)]
    pub session_dir: Option<PathBuf>,

    /// Skip simulated network latency
    #[arg(long, global = true)]
    pub instant: bool,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Plan a sample trip end to end
    Demo(DemoArgs),
    /// Show the signed-in user
    Whoami,
    /// Sign in with an email or as a guest
    SignIn(SignInArgs),
    /// Sign out and clear the stored session
    SignOut,
}

#[derive(Args)]
pub struct DemoArgs {
    #[arg(long, default_value = "Lisbon")]
    pub destination: String,
    #[arg(long, default_value = "3")]
    pub days: u32,
}

#[derive(Args)]
pub struct SignInArgs {
    #[arg(long, conflicts_with = "anonymous", required_unless_present = "anonymous")]
    pub email: Option<String>,
    #[arg(long, default_value = "")]
    pub password: String,
    #[arg(long)]
    pub anonymous: bool,
}
