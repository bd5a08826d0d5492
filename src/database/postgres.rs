use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::database::models::{MemberRow, OrganizationMember};
use crate::database::store::{MemberStore, StoreError};
use crate::hierarchy::RoleType;

const SCHEMA: &str = include_str!("../../migrations/0001_org_members.sql");

const SELECT_COLUMNS: &str = r#"
    SELECT id, email, name, role, zone, municipality, hierarchy_level, reports_to,
           can_create_roles, managed_territories, permissions, is_active, metadata,
           created_at, updated_at
    FROM org_members
"#;

/// Member store backed by the `org_members` Postgres table
#[derive(Debug, Clone)]
pub struct PgMemberStore {
    pool: PgPool,
}

impl PgMemberStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the table and indexes if they are missing
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        for statement in SCHEMA.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        info!("org_members schema ready");
        Ok(())
    }

    fn into_members(rows: Vec<MemberRow>) -> Result<Vec<OrganizationMember>, StoreError> {
        rows.into_iter()
            .map(|row| OrganizationMember::try_from(row).map_err(StoreError::from))
            .collect()
    }
}

#[async_trait]
impl MemberStore for PgMemberStore {
    async fn insert(&self, member: &OrganizationMember) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO org_members (
                id, email, name, role, zone, municipality, hierarchy_level, reports_to,
                can_create_roles, managed_territories, permissions, is_active, metadata,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(member.id)
        .bind(&member.email)
        .bind(&member.name)
        .bind(member.role.slug())
        .bind(member.zone.map(|z| z.slug()))
        .bind(&member.municipality)
        .bind(i16::from(member.hierarchy_level))
        .bind(member.reports_to)
        .bind(member.can_create_roles.iter().map(|r| r.slug().to_string()).collect::<Vec<_>>())
        .bind(&member.managed_territories)
        .bind(&member.permissions)
        .bind(member.is_active)
        .bind(&member.metadata)
        .bind(member.created_at)
        .bind(member.updated_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {
                debug!("Inserted member {} ({})", member.id, member.role);
                Ok(())
            }
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => Err(StoreError::Conflict(member.id)),
            Err(other) => Err(other.into()),
        }
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<OrganizationMember>, StoreError> {
        let query = format!("{} WHERE id = $1", SELECT_COLUMNS);
        let row = sqlx::query_as::<_, MemberRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(OrganizationMember::try_from).transpose().map_err(StoreError::from)
    }

    async fn find_by_role(
        &self,
        role: RoleType,
        include_inactive: bool,
    ) -> Result<Vec<OrganizationMember>, StoreError> {
        let query = format!(
            "{} WHERE role = $1 AND ($2 OR is_active) ORDER BY created_at, id",
            SELECT_COLUMNS
        );
        let rows = sqlx::query_as::<_, MemberRow>(&query)
            .bind(role.slug())
            .bind(include_inactive)
            .fetch_all(&self.pool)
            .await?;

        Self::into_members(rows)
    }

    async fn find_by_parent(&self, parent: Uuid) -> Result<Vec<OrganizationMember>, StoreError> {
        let query = format!("{} WHERE reports_to = $1 ORDER BY created_at, id", SELECT_COLUMNS);
        let rows = sqlx::query_as::<_, MemberRow>(&query)
            .bind(parent)
            .fetch_all(&self.pool)
            .await?;

        Self::into_members(rows)
    }

    async fn update(&self, member: &OrganizationMember) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE org_members
            SET name = $2, metadata = $3, is_active = $4, updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(member.id)
        .bind(&member.name)
        .bind(&member.metadata)
        .bind(member.is_active)
        .bind(member.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(member.id));
        }
        Ok(())
    }
}
