use std::collections::BTreeSet;
use std::sync::Arc;

use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::directory::MemberDirectory;
use crate::error::OrgError;
use crate::hierarchy::{RoleType, TerritoryCatalog, Zone};

/// Result of a structural coverage sweep
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageReport {
    pub is_valid: bool,
    pub missing_roles: Vec<String>,
    pub suggestions: Vec<String>,
    pub municipal_coverage: f64,
    pub covered_municipalities: usize,
    pub total_municipalities: usize,
    pub uncovered_municipalities: Vec<String>,
}

/// Read-only checks over who currently holds the structural roles.
///
/// Only a missing or duplicated department coordinator invalidates the
/// report. Zone and municipal gaps are advisory.
#[derive(Clone)]
pub struct StructuralAuditor {
    directory: MemberDirectory,
    catalog: Arc<TerritoryCatalog>,
    min_municipal_coverage: f64,
}

impl StructuralAuditor {
    pub fn new(directory: MemberDirectory, catalog: Arc<TerritoryCatalog>, min_municipal_coverage: f64) -> Self {
        Self {
            directory,
            catalog,
            min_municipal_coverage,
        }
    }

    pub async fn check_coverage(&self) -> Result<CoverageReport, OrgError> {
        let mut missing_roles = Vec::new();
        let mut suggestions = Vec::new();

        let root_role = RoleType::DepartmentCoordinator;
        let roots = self.directory.get_by_role(root_role, false).await?;
        let is_valid = roots.len() == 1;
        match roots.len() {
            0 => {
                missing_roles.push(root_role.slug().to_string());
                suggestions.push(format!("Appoint a {} to lead the department", root_role.label()));
            }
            1 => {}
            n => suggestions.push(format!(
                "{} active {} members found; exactly one is expected",
                n,
                root_role.slug()
            )),
        }

        let zone_holders = try_join_all(
            Zone::ALL
                .iter()
                .map(|zone| self.directory.get_by_role(RoleType::ZoneCoordinator(*zone), false)),
        )
        .await?;
        for (zone, holders) in Zone::ALL.iter().zip(zone_holders) {
            if holders.is_empty() {
                let role = RoleType::ZoneCoordinator(*zone);
                missing_roles.push(role.slug().to_string());
                suggestions.push(format!(
                    "Appoint a coordinator for zona {} ({} municipalities)",
                    zone.display_name(),
                    self.catalog.municipalities_in(*zone).len()
                ));
            }
        }

        let leaders = self.directory.get_by_role(RoleType::MunicipalLeader, false).await?;
        let covered: BTreeSet<&str> = leaders
            .iter()
            .filter_map(|leader| leader.municipality.as_deref())
            .filter_map(|name| self.catalog.canonical_municipality(name))
            .collect();

        let total_municipalities = self.catalog.municipality_count();
        let uncovered_municipalities: Vec<String> = self
            .catalog
            .all_municipalities()
            .map(|(name, _)| name)
            .filter(|name| !covered.contains(name))
            .map(str::to_string)
            .collect();
        let covered_municipalities = total_municipalities - uncovered_municipalities.len();

        let municipal_coverage = if total_municipalities == 0 {
            1.0
        } else {
            covered_municipalities as f64 / total_municipalities as f64
        };
        if municipal_coverage < self.min_municipal_coverage {
            suggestions.push(format!(
                "{} of {} municipalities have no active {}; coverage {:.0}% is below the {:.0}% target",
                uncovered_municipalities.len(),
                total_municipalities,
                RoleType::MunicipalLeader.slug(),
                municipal_coverage * 100.0,
                self.min_municipal_coverage * 100.0
            ));
        }

        info!(
            "Coverage check: valid={} missing={} municipal={}/{}",
            is_valid,
            missing_roles.len(),
            covered_municipalities,
            total_municipalities
        );

        Ok(CoverageReport {
            is_valid,
            missing_roles,
            suggestions,
            municipal_coverage,
            covered_municipalities,
            total_municipalities,
            uncovered_municipalities,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{directory_with, member, member_in, member_under};

    async fn auditor_over(members: Vec<crate::database::models::OrganizationMember>) -> StructuralAuditor {
        let (directory, _) = directory_with(members).await;
        StructuralAuditor::new(directory, Arc::new(TerritoryCatalog::cauca()), 0.5)
    }

    #[tokio::test]
    async fn empty_directory_is_invalid_and_lists_everything() {
        let report = auditor_over(vec![]).await.check_coverage().await.unwrap();

        assert!(!report.is_valid);
        assert_eq!(report.missing_roles.len(), 6);
        assert_eq!(report.missing_roles[0], "coordinador-departamental");
        assert_eq!(report.missing_roles[1], "coordinador-zona-norte");
        assert_eq!(report.covered_municipalities, 0);
        assert_eq!(report.total_municipalities, 42);
        assert!(report.suggestions.iter().any(|s| s.contains("42 of 42")));
    }

    #[tokio::test]
    async fn single_root_is_valid_even_with_gaps() {
        let root = member(RoleType::DepartmentCoordinator, None);
        let norte = member_under(RoleType::ZoneCoordinator(Zone::Norte), &root);
        let leader = member_in(RoleType::MunicipalLeader, "inza", Zone::Norte, Some(norte.id));
        let auditor = auditor_over(vec![root, norte, leader]).await;

        let report = auditor.check_coverage().await.unwrap();
        assert!(report.is_valid);
        assert_eq!(report.missing_roles.len(), 4);
        assert!(!report.missing_roles.contains(&"coordinador-zona-norte".to_string()));
        assert_eq!(report.covered_municipalities, 1);
        assert!(!report.uncovered_municipalities.contains(&"Inzá".to_string()));

        // Nothing is written, so a second sweep matches
        assert_eq!(auditor.check_coverage().await.unwrap(), report);
    }

    #[tokio::test]
    async fn two_roots_invalidate_the_report() {
        let a = member(RoleType::DepartmentCoordinator, None);
        let b = member(RoleType::DepartmentCoordinator, None);
        let report = auditor_over(vec![a, b]).await.check_coverage().await.unwrap();

        assert!(!report.is_valid);
        assert!(!report.missing_roles.contains(&"coordinador-departamental".to_string()));
        assert!(report.suggestions[0].starts_with("2 active"));
    }

    #[tokio::test]
    async fn inactive_holders_do_not_count() {
        let root = member(RoleType::DepartmentCoordinator, None);
        let mut sur = member_under(RoleType::ZoneCoordinator(Zone::Sur), &root);
        sur.is_active = false;
        let report = auditor_over(vec![root, sur]).await.check_coverage().await.unwrap();

        assert!(report.missing_roles.contains(&"coordinador-zona-sur".to_string()));
    }
}
