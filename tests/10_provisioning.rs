mod common;

use std::time::Duration;

use anyhow::Result;
use serde_json::json;

use cauca_org_api::database::models::ContactUpdate;
use cauca_org_api::error::{OrgError, UpstreamCause};
use cauca_org_api::hierarchy::{IssueCode, RoleType, Zone};
use cauca_org_api::services::CreateMemberRequest;

use common::harness;

fn codes(err: &OrgError) -> Vec<IssueCode> {
    match err {
        OrgError::ValidationFailed { errors, .. } => errors.iter().map(|e| e.code).collect(),
        other => panic!("expected validation failure, got {other:?}"),
    }
}

#[tokio::test]
async fn department_coordinator_creates_zone_coordinator() -> Result<()> {
    let h = harness();
    let root = h.root().await?;

    let created = h
        .create(
            &root,
            CreateMemberRequest::new("Coordinación Norte", "norte@cauca.test", RoleType::ZoneCoordinator(Zone::Norte))
                .in_zone(Zone::Norte),
        )
        .await?;

    let member = created.member;
    assert_eq!(member.reports_to, Some(root.id));
    assert_eq!(member.zone, Some(Zone::Norte));
    assert_eq!(member.hierarchy_level, 2);
    assert_eq!(member.managed_territories.first().map(String::as_str), Some("Norte"));
    assert_eq!(member.managed_territories.len(), 16);
    assert!(member.can_create_roles.contains(&RoleType::MunicipalLeader));
    assert!(h.issuer.verify(member.id, &created.temporary_credential).await);

    let stored = h.state.directory().get_by_id(member.id).await?;
    assert_eq!(stored, member);
    Ok(())
}

#[tokio::test]
async fn council_member_cannot_create_department_coordinator() -> Result<()> {
    let h = harness();
    let (_, _, leader) = h.seeded_chain().await?;
    let concejal = h
        .create(
            &leader,
            CreateMemberRequest::new("Concejal", "concejal@cauca.test", RoleType::CouncilMember),
        )
        .await?
        .member;

    let err = h
        .create(
            &concejal,
            CreateMemberRequest::new("Intruso", "intruso@cauca.test", RoleType::DepartmentCoordinator),
        )
        .await
        .unwrap_err();

    let found = codes(&err);
    assert!(found.contains(&IssueCode::RoleNotCreatable));
    assert!(found.contains(&IssueCode::LevelNotSubordinate));
    assert!(matches!(err, OrgError::ValidationFailed { suggested_role: Some(RoleType::CommunityLeader), .. }));
    assert_eq!(h.store.len().await, 4);
    Ok(())
}

#[tokio::test]
async fn zone_coordinator_cannot_create_leader_outside_its_zone() -> Result<()> {
    let h = harness();
    let root = h.root().await?;
    let sur = h
        .create(&root, CreateMemberRequest::new("Zona Sur", "sur@cauca.test", RoleType::ZoneCoordinator(Zone::Sur)))
        .await?
        .member;

    let err = h
        .create(
            &sur,
            CreateMemberRequest::new("Líder Inzá", "inza@cauca.test", RoleType::MunicipalLeader).in_municipality("Inza"),
        )
        .await
        .unwrap_err();

    assert_eq!(codes(&err), vec![IssueCode::TerritoryOutOfScope]);

    // no identity was issued for the denied request
    let retry = h
        .create(
            &root,
            CreateMemberRequest::new("Líder Inzá", "inza@cauca.test", RoleType::MunicipalLeader).in_municipality("Inzá"),
        )
        .await?;
    assert_eq!(retry.member.zone, Some(Zone::Norte));
    Ok(())
}

#[tokio::test]
async fn failed_insert_revokes_the_issued_identity() -> Result<()> {
    let h = harness();
    let root = h.root().await?;
    h.store.fail_inserts(true);

    let err = h
        .create(&root, CreateMemberRequest::new("Votante", "votante@cauca.test", RoleType::Voter).in_municipality("Popayán"))
        .await
        .unwrap_err();
    assert!(err.is_upstream(), "unexpected error: {err:?}");
    assert_eq!(h.store.len().await, 1);

    let issued = h.issuer.issued_to("votante@cauca.test").await;
    assert_eq!(issued.len(), 1);
    assert!(!h.issuer.is_active(issued[0]).await);

    // the revoked identity freed the e-mail, so a retry after recovery succeeds
    h.store.fail_inserts(false);
    let retry = h
        .create(&root, CreateMemberRequest::new("Votante", "votante@cauca.test", RoleType::Voter).in_municipality("Popayán"))
        .await?;
    assert!(h.issuer.is_active(retry.member.id).await);
    Ok(())
}

#[tokio::test]
async fn slow_insert_times_out_and_revokes() -> Result<()> {
    let h = harness();
    let root = h.root().await?;
    h.store.delay_inserts(Duration::from_millis(500));

    let err = h
        .create(&root, CreateMemberRequest::new("Lento", "lento@cauca.test", RoleType::Sympathizer).in_zone(Zone::Sur))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        OrgError::UpstreamFailure { source: UpstreamCause::Timeout(_), .. }
    ));
    assert_eq!(h.store.len().await, 1);

    let issued = h.issuer.issued_to("lento@cauca.test").await;
    assert_eq!(issued.len(), 1);
    assert!(!h.issuer.is_active(issued[0]).await);
    Ok(())
}

#[tokio::test]
async fn abandoned_call_still_revokes_when_the_insert_times_out() -> Result<()> {
    let h = harness();
    let root = h.root().await?;
    h.store.delay_inserts(Duration::from_millis(500));

    let request = CreateMemberRequest::new("Ana", "ana@cauca.test", RoleType::Sympathizer).in_zone(Zone::Sur);
    let abandoned = tokio::time::timeout(Duration::from_millis(50), h.create(&root, request.clone())).await;
    assert!(abandoned.is_err());

    // the detached insert hits the 200ms store timeout and revokes
    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(h.store.len().await, 1);
    let issued = h.issuer.issued_to("ana@cauca.test").await;
    assert_eq!(issued.len(), 1);
    assert!(!h.issuer.is_active(issued[0]).await);

    h.store.delay_inserts(Duration::ZERO);
    let retry = h.create(&root, request).await?;
    assert!(h.issuer.is_active(retry.member.id).await);
    Ok(())
}

#[tokio::test]
async fn abandoned_call_still_lands_member_and_identity_together() -> Result<()> {
    let h = harness();
    let root = h.root().await?;
    h.store.delay_inserts(Duration::from_millis(100));

    let request = CreateMemberRequest::new("Luis", "luis@cauca.test", RoleType::Sympathizer).in_zone(Zone::Sur);
    let abandoned = tokio::time::timeout(Duration::from_millis(20), h.create(&root, request)).await;
    assert!(abandoned.is_err());

    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(h.store.len().await, 2);
    let issued = h.issuer.issued_to("luis@cauca.test").await;
    assert_eq!(issued.len(), 1);
    assert!(h.issuer.is_active(issued[0]).await);
    let stored = h.state.directory().get_by_id(issued[0]).await?;
    assert_eq!(stored.reports_to, Some(root.id));
    Ok(())
}

#[tokio::test]
async fn invalid_requests_are_rejected_before_any_lookup() -> Result<()> {
    let h = harness();
    let root = h.root().await?;

    let mut request = CreateMemberRequest::new("  ", "sin-arroba", RoleType::Voter);
    request.metadata = Some(json!("not an object"));
    let err = h.create(&root, request).await.unwrap_err();

    assert_eq!(codes(&err), vec![IssueCode::InvalidRequest; 3]);
    Ok(())
}

#[tokio::test]
async fn unknown_creator_is_not_found() -> Result<()> {
    let h = harness();
    let err = h
        .state
        .provisioning
        .create_member(uuid::Uuid::new_v4(), CreateMemberRequest::new("Ana", "ana@cauca.test", RoleType::Voter))
        .await
        .unwrap_err();
    assert!(matches!(err, OrgError::NotFound(msg) if msg.contains("creator not found")));
    Ok(())
}

#[tokio::test]
async fn bootstrap_twice_is_a_conflict() -> Result<()> {
    let h = harness();
    h.root().await?;

    let err = h
        .state
        .provisioning
        .bootstrap_root("Otra", "otra@cauca.test")
        .await
        .unwrap_err();
    assert!(matches!(err, OrgError::Conflict(_)));
    Ok(())
}

#[tokio::test]
async fn concurrent_creations_under_one_creator_all_land() -> Result<()> {
    let h = harness();
    let (_, _, leader) = h.seeded_chain().await?;

    let attempts = (0..20).map(|i| {
        let provisioning = h.state.provisioning.clone();
        let creator = leader.id;
        tokio::spawn(async move {
            provisioning
                .create_member(
                    creator,
                    CreateMemberRequest::new(format!("Votante {i}"), format!("votante{i}@cauca.test"), RoleType::Voter),
                )
                .await
        })
    });

    let mut ids = std::collections::HashSet::new();
    for handle in futures::future::join_all(attempts).await {
        let created = handle??;
        assert_eq!(created.member.reports_to, Some(leader.id));
        assert_eq!(created.member.municipality.as_deref(), Some("Popayán"));
        ids.insert(created.member.id);
    }
    assert_eq!(ids.len(), 20);
    assert_eq!(h.state.directory().get_direct_subordinates(leader.id).await?.len(), 20);
    Ok(())
}

#[tokio::test]
async fn only_superiors_may_deactivate() -> Result<()> {
    let h = harness();
    let (root, zone, leader) = h.seeded_chain().await?;
    let other_zone = h
        .create(&root, CreateMemberRequest::new("Zona Sur", "sur@cauca.test", RoleType::ZoneCoordinator(Zone::Sur)))
        .await?
        .member;

    let err = h
        .state
        .provisioning
        .deactivate_member(other_zone.id, leader.id)
        .await
        .unwrap_err();
    assert!(matches!(err, OrgError::Forbidden(_)));

    // nobody deactivates themselves
    let err = h.state.provisioning.deactivate_member(leader.id, leader.id).await.unwrap_err();
    assert!(matches!(err, OrgError::Forbidden(_)));

    let deactivated = h.state.provisioning.deactivate_member(zone.id, leader.id).await?;
    assert!(!deactivated.is_active);
    assert!(h
        .state
        .directory()
        .get_by_role(RoleType::MunicipalLeader, false)
        .await?
        .is_empty());

    // idempotent
    let again = h.state.provisioning.deactivate_member(root.id, leader.id).await?;
    assert!(!again.is_active);
    Ok(())
}

#[tokio::test]
async fn contact_updates_by_self_or_superior() -> Result<()> {
    let h = harness();
    let (root, zone, leader) = h.seeded_chain().await?;

    let updated = h
        .state
        .provisioning
        .update_contact(
            leader.id,
            leader.id,
            ContactUpdate {
                name: Some("Líder de Popayán".to_string()),
                metadata: Some(json!({ "phone": "+57 300 000 0000" })),
            },
        )
        .await?;
    assert_eq!(updated.name, "Líder de Popayán");
    assert_eq!(updated.role, leader.role);

    let renamed = h
        .state
        .provisioning
        .update_contact(
            root.id,
            zone.id,
            ContactUpdate {
                name: Some("Coordinación Centro".to_string()),
                metadata: None,
            },
        )
        .await?;
    assert_eq!(renamed.name, "Coordinación Centro");

    let err = h
        .state
        .provisioning
        .update_contact(leader.id, zone.id, ContactUpdate::default())
        .await
        .unwrap_err();
    assert!(matches!(err, OrgError::Forbidden(_)));
    Ok(())
}

#[tokio::test]
async fn snapshots_survive_in_the_directory() -> Result<()> {
    let h = harness();
    let (root, _, leader) = h.seeded_chain().await?;

    let chain = h.state.directory().get_superior_chain(leader.id).await?;
    assert_eq!(chain.last().map(|m| m.id), Some(root.id));
    assert_eq!(leader.managed_territories, vec!["Popayán"]);
    assert_eq!(leader.zone, Some(Zone::Centro));
    assert!(leader.permissions.iter().any(|p| p == "members:create"));
    Ok(())
}
