mod common;

use anyhow::Result;

use cauca_org_api::hierarchy::{RoleType, Zone};
use cauca_org_api::services::CreateMemberRequest;

use common::harness;

#[tokio::test]
async fn missing_zone_coordinators_are_advisory() -> Result<()> {
    let h = harness();
    let root = h.root().await?;
    for (zone, email) in [
        (Zone::Norte, "norte@cauca.test"),
        (Zone::Centro, "centro@cauca.test"),
        (Zone::Oriente, "oriente@cauca.test"),
    ] {
        h.create(&root, CreateMemberRequest::new("Coordinación", email, RoleType::ZoneCoordinator(zone)))
            .await?;
    }

    let report = h.state.auditor.check_coverage().await?;

    assert!(report.is_valid);
    assert_eq!(report.missing_roles, vec!["coordinador-zona-sur", "coordinador-zona-occidente"]);
    assert!(report.suggestions.iter().any(|s| s.contains("Sur")));
    assert!(report.suggestions.iter().any(|s| s.contains("Occidente")));
    Ok(())
}

#[tokio::test]
async fn coverage_counts_active_municipal_leaders() -> Result<()> {
    let h = harness();
    let (_, zone, leader) = h.seeded_chain().await?;
    h.create(
        &zone,
        CreateMemberRequest::new("Líder Timbío", "timbio@cauca.test", RoleType::MunicipalLeader).in_municipality("timbio"),
    )
    .await?;

    let report = h.state.auditor.check_coverage().await?;
    assert_eq!(report.covered_municipalities, 2);
    assert_eq!(report.total_municipalities, 42);
    assert!(!report.uncovered_municipalities.contains(&"Popayán".to_string()));
    assert!(report.suggestions.iter().any(|s| s.starts_with("40 of 42")));

    h.state.provisioning.deactivate_member(zone.id, leader.id).await?;
    let report = h.state.auditor.check_coverage().await?;
    assert_eq!(report.covered_municipalities, 1);
    assert!(report.uncovered_municipalities.contains(&"Popayán".to_string()));
    Ok(())
}

#[tokio::test]
async fn coverage_check_is_idempotent() -> Result<()> {
    let h = harness();
    h.seeded_chain().await?;

    let first = h.state.auditor.check_coverage().await?;
    let second = h.state.auditor.check_coverage().await?;
    assert_eq!(first, second);
    assert_eq!(h.store.len().await, 3);
    Ok(())
}

#[tokio::test]
async fn empty_directory_has_no_root() -> Result<()> {
    let h = harness();
    let report = h.state.auditor.check_coverage().await?;

    assert!(!report.is_valid);
    assert_eq!(report.missing_roles.first().map(String::as_str), Some("coordinador-departamental"));
    Ok(())
}
