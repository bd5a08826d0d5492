use clap::Subcommand;

use crate::cli::client::ApiClient;
use crate::cli::utils::{envelope_data, output_json};
use crate::cli::OutputFormat;
use crate::services::CoverageReport;

#[derive(Subcommand)]
pub enum AuditCommands {
    #[command(about = "Run the structural coverage check")]
    Coverage,
}

pub async fn handle(cmd: AuditCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let client = ApiClient::from_env()?;

    match cmd {
        AuditCommands::Coverage => {
            let data = envelope_data(client.get("/api/audit/coverage").await?);

            match output_format {
                OutputFormat::Json => output_json(&data)?,
                OutputFormat::Text => {
                    let report: CoverageReport = serde_json::from_value(data)?;
                    let status = if report.is_valid { "valid" } else { "INVALID" };
                    println!("Structure: {}", status);
                    println!(
                        "Municipal coverage: {}/{} ({:.0}%)",
                        report.covered_municipalities,
                        report.total_municipalities,
                        report.municipal_coverage * 100.0
                    );
                    if !report.missing_roles.is_empty() {
                        println!("Missing roles: {}", report.missing_roles.join(", "));
                    }
                    for suggestion in &report.suggestions {
                        println!("  - {}", suggestion);
                    }
                }
            }
            Ok(())
        }
    }
}
