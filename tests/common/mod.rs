#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use cauca_org_api::auth::{generate_jwt, Claims};
use cauca_org_api::config::AppConfig;
use cauca_org_api::database::models::OrganizationMember;
use cauca_org_api::database::{MemberStore, MemoryMemberStore, StoreError};
use cauca_org_api::error::OrgError;
use cauca_org_api::hierarchy::{RoleType, Zone};
use cauca_org_api::server::{app, AppState};
use cauca_org_api::services::{CreateMemberRequest, LocalIdentityIssuer, ProvisionedMember};

pub const TEST_SECRET: &str = "integration-test-secret";

/// Memory store with switchable insert faults
#[derive(Default)]
pub struct FaultyStore {
    inner: MemoryMemberStore,
    fail_inserts: AtomicBool,
    insert_delay_ms: AtomicU64,
}

impl FaultyStore {
    pub fn fail_inserts(&self, fail: bool) {
        self.fail_inserts.store(fail, Ordering::SeqCst);
    }

    pub fn delay_inserts(&self, delay: Duration) {
        self.insert_delay_ms.store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    pub async fn len(&self) -> usize {
        self.inner.len().await
    }
}

#[async_trait]
impl MemberStore for FaultyStore {
    async fn insert(&self, member: &OrganizationMember) -> Result<(), StoreError> {
        let delay = self.insert_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("simulated insert fault".to_string()));
        }
        self.inner.insert(member).await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<OrganizationMember>, StoreError> {
        self.inner.find_by_id(id).await
    }

    async fn find_by_role(
        &self,
        role: RoleType,
        include_inactive: bool,
    ) -> Result<Vec<OrganizationMember>, StoreError> {
        self.inner.find_by_role(role, include_inactive).await
    }

    async fn find_by_parent(&self, parent: Uuid) -> Result<Vec<OrganizationMember>, StoreError> {
        self.inner.find_by_parent(parent).await
    }

    async fn update(&self, member: &OrganizationMember) -> Result<(), StoreError> {
        self.inner.update(member).await
    }
}

/// Services wired over a fault-injecting store and an inspectable issuer
pub struct Harness {
    pub state: AppState,
    pub store: Arc<FaultyStore>,
    pub issuer: Arc<LocalIdentityIssuer>,
}

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::development();
    config.provisioning.store_timeout_ms = 200;
    config.provisioning.identity_timeout_ms = 200;
    config.security.jwt_secret = TEST_SECRET.to_string();
    config.api.enable_request_logging = false;
    config
}

pub fn harness() -> Harness {
    let store = Arc::new(FaultyStore::default());
    let issuer = Arc::new(LocalIdentityIssuer::new());
    let state = AppState::new(store.clone(), issuer.clone(), &test_config());
    Harness { state, store, issuer }
}

impl Harness {
    pub async fn root(&self) -> Result<OrganizationMember> {
        let root = self
            .state
            .provisioning
            .bootstrap_root("Coordinación Departamental", "root@cauca.test")
            .await?;
        Ok(root.member)
    }

    pub async fn create(
        &self,
        creator: &OrganizationMember,
        request: CreateMemberRequest,
    ) -> Result<ProvisionedMember, OrgError> {
        self.state.provisioning.create_member(creator.id, request).await
    }

    /// Root -> zone coordinator (Centro) -> municipal leader (Popayán)
    pub async fn seeded_chain(&self) -> Result<(OrganizationMember, OrganizationMember, OrganizationMember)> {
        let root = self.root().await?;
        let zone = self
            .create(
                &root,
                CreateMemberRequest::new("Zona Centro", "centro@cauca.test", RoleType::ZoneCoordinator(Zone::Centro)),
            )
            .await?
            .member;
        let leader = self
            .create(
                &zone,
                CreateMemberRequest::new("Líder Popayán", "popayan@cauca.test", RoleType::MunicipalLeader)
                    .in_municipality("Popayán"),
            )
            .await?
            .member;
        Ok((root, zone, leader))
    }

    pub fn token_for(&self, member: &OrganizationMember) -> String {
        let claims = Claims::new(member.id, member.role, 1);
        generate_jwt(&claims, TEST_SECRET).expect("token")
    }

    /// Send one request through the router and decode the JSON body
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Result<(StatusCode, Value)> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&json)?))?,
            None => builder.body(Body::empty())?,
        };

        let response = app(self.state.clone()).oneshot(request).await?;
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)?
        };
        Ok((status, json))
    }
}
