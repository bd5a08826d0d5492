use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::{output_json, output_success};
use crate::cli::OutputFormat;
use crate::hierarchy::{HierarchyTable, RoleType, TerritoryCatalog};

#[derive(Subcommand)]
pub enum PolicyCommands {
    #[command(about = "List roles with level and creatable roles")]
    Roles,

    #[command(about = "List zones and their municipalities")]
    Zones,

    #[command(about = "Check the creation matrix and territory catalog for consistency")]
    Check,
}

pub async fn handle(cmd: PolicyCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let table = HierarchyTable::standard();
    let catalog = TerritoryCatalog::cauca();

    match cmd {
        PolicyCommands::Roles => match output_format {
            OutputFormat::Json => {
                let roles: Vec<_> = RoleType::ALL
                    .iter()
                    .map(|role| {
                        json!({
                            "role": role,
                            "label": role.label(),
                            "level": table.level_of(*role),
                            "can_create": table.allowed_targets(*role),
                        })
                    })
                    .collect();
                output_json(&json!({ "roles": roles }))
            }
            OutputFormat::Text => {
                println!("{:<30} {:<6} {}", "ROLE", "LEVEL", "CAN CREATE");
                println!("{}", "-".repeat(90));
                for role in RoleType::ALL {
                    let targets: Vec<&str> = table.allowed_targets(role).iter().map(|t| t.slug()).collect();
                    let targets = if targets.is_empty() { "-".to_string() } else { targets.join(", ") };
                    println!("{:<30} {:<6} {}", role.slug(), table.level_of(role), targets);
                }
                Ok(())
            }
        },
        PolicyCommands::Zones => match output_format {
            OutputFormat::Json => {
                let zones: Vec<_> = catalog
                    .zones()
                    .map(|zone| {
                        json!({
                            "zone": zone,
                            "name": zone.display_name(),
                            "municipalities": catalog.municipalities_in(zone),
                        })
                    })
                    .collect();
                output_json(&json!({ "zones": zones }))
            }
            OutputFormat::Text => {
                for zone in catalog.zones() {
                    let municipalities = catalog.municipalities_in(zone);
                    println!("{} ({})", zone.display_name(), municipalities.len());
                    for name in municipalities {
                        println!("  {}", name);
                    }
                }
                Ok(())
            }
        },
        PolicyCommands::Check => {
            let violations = table.consistency_violations();
            if !violations.is_empty() {
                for v in &violations {
                    eprintln!(
                        "{} (level {}) may create {} (level {})",
                        v.creator, v.creator_level, v.target, v.target_level
                    );
                }
                anyhow::bail!("creation matrix has {} inconsistent entries", violations.len());
            }

            output_success(
                &output_format,
                &format!(
                    "Policy consistent: {} roles, {} municipalities in {} zones",
                    RoleType::ALL.len(),
                    catalog.municipality_count(),
                    catalog.zones().count()
                ),
                Some(json!({
                    "roles": RoleType::ALL.len(),
                    "municipalities": catalog.municipality_count(),
                })),
            )
        }
    }
}
