use clap::Args;

use crate::cli::utils::output_json;
use crate::cli::OutputFormat;
use crate::hierarchy::{
    AuthorizationValidator, CreatorProfile, HierarchyTable, RoleType, TargetRequest, TerritoryCatalog, Zone,
};

#[derive(Args)]
pub struct ValidateArgs {
    #[arg(long, help = "Creator role slug, e.g. lider-municipal")]
    pub creator_role: RoleType,

    #[arg(long, help = "Creator zone")]
    pub creator_zone: Option<Zone>,

    #[arg(long, help = "Creator municipality")]
    pub creator_municipality: Option<String>,

    #[arg(help = "Role to create")]
    pub role: RoleType,

    #[arg(long, help = "Target municipality")]
    pub municipality: Option<String>,

    #[arg(long, help = "Target zone")]
    pub zone: Option<Zone>,
}

pub async fn handle(args: ValidateArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let validator = AuthorizationValidator::new(HierarchyTable::standard().into(), TerritoryCatalog::cauca().into());

    let creator = CreatorProfile::new(args.creator_role, args.creator_zone, args.creator_municipality.as_deref());
    let target = TargetRequest {
        role: args.role,
        municipality: args.municipality,
        zone: args.zone,
    };
    let outcome = validator.validate(&creator, &target);

    match output_format {
        OutputFormat::Json => output_json(&serde_json::to_value(&outcome)?)?,
        OutputFormat::Text => {
            if outcome.allowed {
                println!("✓ {} may create {}", creator.role, target.role);
            } else {
                println!("✗ {} may not create {}", creator.role, target.role);
            }
            for issue in &outcome.errors {
                println!("  error   {}: {}", issue.code.as_str(), issue.message);
            }
            for issue in &outcome.warnings {
                println!("  warning {}: {}", issue.code.as_str(), issue.message);
            }
            if let Some(suggested) = outcome.suggested_role {
                println!("  suggested role: {}", suggested);
            }
        }
    }

    if !outcome.allowed {
        anyhow::bail!("request denied with {} error(s)", outcome.errors.len());
    }
    Ok(())
}
