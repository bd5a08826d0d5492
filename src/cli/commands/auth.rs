use clap::Subcommand;
use serde_json::json;
use uuid::Uuid;

use crate::auth::{generate_jwt, Claims};
use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::config;
use crate::hierarchy::RoleType;

#[derive(Subcommand)]
pub enum AuthCommands {
    #[command(about = "Mint a bearer token for a member using the configured secret")]
    Token {
        #[arg(help = "Member id the token is issued for")]
        member_id: Uuid,
        #[arg(long, help = "Role slug recorded in the token")]
        role: RoleType,
        #[arg(long, help = "Lifetime in hours (defaults to SECURITY_JWT_EXPIRY_HOURS)")]
        hours: Option<u64>,
    },
}

pub async fn handle(cmd: AuthCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        AuthCommands::Token { member_id, role, hours } => {
            let security = &config::config().security;
            let claims = Claims::new(member_id, role, hours.unwrap_or(security.jwt_expiry_hours));
            let token = generate_jwt(&claims, &security.jwt_secret)?;

            match output_format {
                OutputFormat::Json => output_success(
                    &output_format,
                    "Token issued",
                    Some(json!({ "token": token, "expires_at": claims.exp })),
                ),
                OutputFormat::Text => {
                    println!("{}", token);
                    Ok(())
                }
            }
        }
    }
}
