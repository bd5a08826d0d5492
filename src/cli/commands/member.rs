use clap::Subcommand;
use serde_json::Value;
use uuid::Uuid;

use crate::cli::client::ApiClient;
use crate::cli::utils::{envelope_data, output_json, output_member, output_members, output_success};
use crate::cli::OutputFormat;
use crate::hierarchy::{RoleType, Zone};
use crate::services::CreateMemberRequest;

#[derive(Subcommand)]
pub enum MemberCommands {
    #[command(about = "Create a member reporting to the token's member")]
    Create {
        #[arg(help = "Full name")]
        name: String,
        #[arg(help = "Email")]
        email: String,
        #[arg(help = "Role slug, e.g. votante")]
        role: RoleType,
        #[arg(long, help = "Municipality")]
        municipality: Option<String>,
        #[arg(long, help = "Zone")]
        zone: Option<Zone>,
    },

    #[command(about = "Show a member")]
    Show {
        #[arg(help = "Member id")]
        id: Uuid,
    },

    #[command(about = "List members reporting to a member")]
    Subordinates {
        #[arg(help = "Member id")]
        id: Uuid,
        #[arg(long, help = "Include indirect reports")]
        transitive: bool,
    },

    #[command(about = "Show the reporting chain above a member")]
    Superiors {
        #[arg(help = "Member id")]
        id: Uuid,
    },

    #[command(about = "Deactivate a member")]
    Deactivate {
        #[arg(help = "Member id")]
        id: Uuid,
    },
}

pub async fn handle(cmd: MemberCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let client = ApiClient::from_env()?;

    match cmd {
        MemberCommands::Create {
            name,
            email,
            role,
            municipality,
            zone,
        } => {
            let request = CreateMemberRequest {
                name,
                email,
                target_role: role,
                municipality,
                zone,
                metadata: None,
            };
            let body = client.post("/api/members", &request).await?;
            report_creation(&output_format, body)
        }
        MemberCommands::Show { id } => {
            let member = envelope_data(client.get(&format!("/api/members/{}", id)).await?);
            output_member(&output_format, &member)
        }
        MemberCommands::Subordinates { id, transitive } => {
            let path = format!("/api/members/{}/subordinates?transitive={}", id, transitive);
            let members = envelope_data(client.get(&path).await?);
            output_members(&output_format, &members, "No subordinates")
        }
        MemberCommands::Superiors { id } => {
            let members = envelope_data(client.get(&format!("/api/members/{}/superiors", id)).await?);
            output_members(&output_format, &members, "No superiors (member is a root)")
        }
        MemberCommands::Deactivate { id } => {
            envelope_data(client.delete(&format!("/api/members/{}", id)).await?);
            output_success(&output_format, &format!("Member {} deactivated", id), None)
        }
    }
}

fn report_creation(output_format: &OutputFormat, body: Value) -> anyhow::Result<()> {
    if let OutputFormat::Json = output_format {
        return output_json(&body);
    }

    if body.get("success").and_then(Value::as_bool) == Some(true) {
        let member = body.get("member").cloned().unwrap_or(Value::Null);
        output_member(output_format, &member)?;
        if let Some(credential) = body.get("temporary_credential").and_then(Value::as_str) {
            println!("{:<16} {}", "credential:", credential);
        }
        return Ok(());
    }

    let errors = body
        .get("validation_errors")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    for issue in &errors {
        eprintln!(
            "  {}: {}",
            issue.get("code").and_then(Value::as_str).unwrap_or("ERROR"),
            issue.get("message").and_then(Value::as_str).unwrap_or("")
        );
    }
    if let Some(suggested) = body.get("suggested_role").and_then(Value::as_str) {
        eprintln!("  suggested role: {}", suggested);
    }
    anyhow::bail!("member creation denied with {} error(s)", errors.len())
}
