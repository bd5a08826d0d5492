use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Identity already issued for {0}")]
    AlreadyIssued(String),

    #[error("Identity not found: {0}")]
    NotFound(Uuid),

    #[error("Identity provider unavailable: {0}")]
    Unavailable(String),
}

/// Account handle plus the one-time credential handed to the new member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuedIdentity {
    pub id: Uuid,
    pub temporary_credential: String,
}

/// Allocates login identities. `revoke` is the compensating action used
/// when the member node cannot be persisted.
#[async_trait]
pub trait IdentityIssuer: Send + Sync {
    async fn issue(&self, email: &str) -> Result<IssuedIdentity, IdentityError>;

    async fn revoke(&self, id: Uuid) -> Result<(), IdentityError>;
}

#[derive(Debug, Clone)]
struct LocalIdentity {
    email: String,
    credential_digest: String,
    revoked: bool,
}

/// In-process issuer. Only a SHA-256 digest of each temporary credential
/// is retained.
#[derive(Debug, Clone, Default)]
pub struct LocalIdentityIssuer {
    identities: Arc<RwLock<HashMap<Uuid, LocalIdentity>>>,
}

impl LocalIdentityIssuer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the identity exists and has not been revoked
    pub async fn is_active(&self, id: Uuid) -> bool {
        self.identities
            .read()
            .await
            .get(&id)
            .map(|identity| !identity.revoked)
            .unwrap_or(false)
    }

    /// Every identity ever issued for an e-mail, revoked ones included
    pub async fn issued_to(&self, email: &str) -> Vec<Uuid> {
        let email = email.trim().to_lowercase();
        self.identities
            .read()
            .await
            .iter()
            .filter(|(_, identity)| identity.email == email)
            .map(|(id, _)| *id)
            .collect()
    }

    /// Check a temporary credential against the stored digest
    pub async fn verify(&self, id: Uuid, credential: &str) -> bool {
        self.identities
            .read()
            .await
            .get(&id)
            .map(|identity| !identity.revoked && identity.credential_digest == digest(credential))
            .unwrap_or(false)
    }

    fn generate_credential(id: Uuid, email: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(Uuid::new_v4().as_bytes());
        hasher.update(id.as_bytes());
        hasher.update(email.as_bytes());
        let hash = format!("{:x}", hasher.finalize());

        // 16 hex characters are plenty for a one-time password
        hash[..16].to_string()
    }
}

#[async_trait]
impl IdentityIssuer for LocalIdentityIssuer {
    async fn issue(&self, email: &str) -> Result<IssuedIdentity, IdentityError> {
        let email = email.trim().to_lowercase();
        let mut identities = self.identities.write().await;

        if identities.values().any(|identity| !identity.revoked && identity.email == email) {
            return Err(IdentityError::AlreadyIssued(email));
        }

        let id = Uuid::new_v4();
        let temporary_credential = Self::generate_credential(id, &email);
        identities.insert(
            id,
            LocalIdentity {
                email,
                credential_digest: digest(&temporary_credential),
                revoked: false,
            },
        );

        Ok(IssuedIdentity {
            id,
            temporary_credential,
        })
    }

    async fn revoke(&self, id: Uuid) -> Result<(), IdentityError> {
        let mut identities = self.identities.write().await;
        let identity = identities.get_mut(&id).ok_or(IdentityError::NotFound(id))?;
        identity.revoked = true;
        Ok(())
    }
}

fn digest(credential: &str) -> String {
    format!("{:x}", Sha256::digest(credential.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn issues_unique_identities_per_email() {
        let issuer = LocalIdentityIssuer::new();
        let first = issuer.issue("Ana@Example.org ").await.unwrap();
        assert_eq!(first.temporary_credential.len(), 16);
        assert!(issuer.verify(first.id, &first.temporary_credential).await);

        let err = issuer.issue("ana@example.org").await.unwrap_err();
        assert!(matches!(err, IdentityError::AlreadyIssued(_)));
    }

    #[tokio::test]
    async fn revoked_identities_free_the_email() {
        let issuer = LocalIdentityIssuer::new();
        let issued = issuer.issue("luis@example.org").await.unwrap();

        issuer.revoke(issued.id).await.unwrap();
        assert!(!issuer.is_active(issued.id).await);
        assert!(!issuer.verify(issued.id, &issued.temporary_credential).await);

        let again = issuer.issue("luis@example.org").await.unwrap();
        assert_ne!(again.id, issued.id);

        let mut ids = issuer.issued_to(" Luis@Example.org").await;
        ids.sort();
        let mut expected = vec![issued.id, again.id];
        expected.sort();
        assert_eq!(ids, expected);
    }

    #[tokio::test]
    async fn revoking_unknown_identity_fails() {
        let issuer = LocalIdentityIssuer::new();
        let err = issuer.revoke(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, IdentityError::NotFound(_)));
    }
}
