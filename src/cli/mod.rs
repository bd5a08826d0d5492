pub mod client;
pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "org")]
#[command(about = "Org CLI - role hierarchy tools and Cauca Org API client")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Inspect the role hierarchy and territory tables")]
    Policy {
        #[command(subcommand)]
        cmd: commands::policy::PolicyCommands,
    },

    #[command(about = "Check a creation request offline against the standard policy")]
    Validate(commands::validate::ValidateArgs),

    #[command(about = "Member operations against a running server")]
    Member {
        #[command(subcommand)]
        cmd: commands::member::MemberCommands,
    },

    #[command(about = "Structural audits against a running server")]
    Audit {
        #[command(subcommand)]
        cmd: commands::audit::AuditCommands,
    },

    #[command(about = "Authentication and token management")]
    Auth {
        #[command(subcommand)]
        cmd: commands::auth::AuthCommands,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::Policy { cmd } => commands::policy::handle(cmd, output_format).await,
        Commands::Validate(args) => commands::validate::handle(args, output_format).await,
        Commands::Member { cmd } => commands::member::handle(cmd, output_format).await,
        Commands::Audit { cmd } => commands::audit::handle(cmd, output_format).await,
        Commands::Auth { cmd } => commands::auth::handle(cmd, output_format).await,
    }
}
