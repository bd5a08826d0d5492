use std::sync::Arc;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use crate::config::{AppConfig, BootstrapConfig, StoreBackend};
use crate::database::{DatabaseManager, MemberStore, MemoryMemberStore, PgMemberStore};
use crate::directory::MemberDirectory;
use crate::error::OrgError;
use crate::handlers::{protected, public};
use crate::hierarchy::{AuthorizationValidator, HierarchyTable, TerritoryCatalog};
use crate::middleware::jwt_auth_middleware;
use crate::services::{IdentityIssuer, LocalIdentityIssuer, ProvisionedMember, ProvisioningService, StructuralAuditor};

/// Shared handler state; every field is cheap to clone
#[derive(Clone)]
pub struct AppState {
    pub provisioning: ProvisioningService,
    pub auditor: StructuralAuditor,
    pub jwt_secret: String,
    pub request_logging: bool,
    pub pool: Option<PgPool>,
}

impl AppState {
    /// Wire the core services over an explicit store and issuer
    pub fn new(store: Arc<dyn MemberStore>, issuer: Arc<dyn IdentityIssuer>, config: &AppConfig) -> Self {
        let table = Arc::new(HierarchyTable::standard());
        let catalog = Arc::new(TerritoryCatalog::cauca());

        let directory = MemberDirectory::new(
            store,
            config.hierarchy.max_traversal_depth,
            config.provisioning.store_timeout(),
        );
        let validator = AuthorizationValidator::new(table, catalog.clone());
        let provisioning = ProvisioningService::new(
            directory.clone(),
            validator,
            issuer,
            config.provisioning.identity_timeout(),
        );
        let auditor = StructuralAuditor::new(directory, catalog, config.audit.min_municipal_coverage);

        Self {
            provisioning,
            auditor,
            jwt_secret: config.security.jwt_secret.clone(),
            request_logging: config.api.enable_request_logging,
            pool: None,
        }
    }

    /// Build the state for the configured store backend
    pub async fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let issuer = Arc::new(LocalIdentityIssuer::new());

        match config.database.backend {
            StoreBackend::Memory => {
                info!("Using in-memory member store");
                Ok(Self::new(Arc::new(MemoryMemberStore::new()), issuer, config))
            }
            StoreBackend::Postgres => {
                let pool = DatabaseManager::connect(&config.database).await?;
                let store = PgMemberStore::new(pool.clone());
                store.ensure_schema().await?;

                let mut state = Self::new(Arc::new(store), issuer, config);
                state.pool = Some(pool);
                Ok(state)
            }
        }
    }

    pub fn directory(&self) -> &MemberDirectory {
        self.provisioning.directory()
    }

    pub fn validator(&self) -> &AuthorizationValidator {
        self.provisioning.validator()
    }
}

/// Create the department root named in config unless one is already active
pub async fn bootstrap_root(state: &AppState, bootstrap: &BootstrapConfig) -> Result<Option<ProvisionedMember>, OrgError> {
    let Some(email) = bootstrap.root_email.as_deref() else {
        return Ok(None);
    };

    match state.provisioning.bootstrap_root(&bootstrap.root_name, email).await {
        Ok(root) => Ok(Some(root)),
        Err(OrgError::Conflict(msg)) => {
            info!("Skipping root bootstrap: {}", msg);
            Ok(None)
        }
        Err(err) => Err(err),
    }
}

pub fn app(state: AppState) -> Router {
    let mut router = Router::new()
        // Public
        .route("/", get(public::root))
        .route("/health", get(public::health))
        .merge(policy_routes())
        // Protected
        .merge(member_routes(state.clone()))
        .layer(CorsLayer::permissive());

    if state.request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }

    router.with_state(state)
}

fn policy_routes() -> Router<AppState> {
    Router::new()
        .route("/api/policy/roles", get(public::policy_roles))
        .route("/api/policy/zones", get(public::policy_zones))
}

fn member_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/members", post(protected::member_create))
        .route("/api/members/validate", post(protected::member_validate))
        .route(
            "/api/members/:id",
            get(protected::member_get)
                .patch(protected::member_update)
                .delete(protected::member_deactivate),
        )
        .route("/api/members/:id/subordinates", get(protected::member_subordinates))
        .route("/api/members/:id/superiors", get(protected::member_superiors))
        .route("/api/roles/:role/members", get(protected::role_members))
        .route("/api/audit/coverage", get(protected::audit_coverage))
        .route_layer(from_fn_with_state(state, jwt_auth_middleware))
}
