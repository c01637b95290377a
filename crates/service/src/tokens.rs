use std::sync::Arc;

use argon2::{Argon2, password_hash::{PasswordHasher, SaltString}};
use rand::rngs::OsRng;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::store::domain::{CreateTokenInput, IssuedToken, TokenRecord};
use crate::store::repository::StorageRepository;

/// Token lifecycle: issuance, resolution, rotation. Independent of the web
/// framework; persistence goes through the repository trait.
pub struct TokenRegistry<R: StorageRepository + ?Sized> {
    repo: Arc<R>,
}

impl<R: StorageRepository + ?Sized> TokenRegistry<R> {
    pub fn new(repo: Arc<R>) -> Self { Self { repo } }

    /// Issue a fresh identity. `token` and `connect` are independent UUIDs;
    /// the refresh token starts out equal to `connect`. A supplied password
    /// is stored only as its argon2 hash.
    #[instrument(skip(self, input, request_host))]
    pub async fn issue(
        &self,
        input: CreateTokenInput,
        request_host: Option<&str>,
    ) -> Result<IssuedToken, ServiceError> {
        let token = Uuid::new_v4().to_string();
        let connect = Uuid::new_v4().to_string();

        let domains = input
            .domains
            .map(|rule| rule.resolve(request_host))
            .unwrap_or_default();
        let backup = input.backup.unwrap_or(false);

        let password_hash = match input.password.as_deref() {
            Some(password) if !password.is_empty() => {
                let salt = SaltString::generate(&mut OsRng);
                let hash = Argon2::default()
                    .hash_password(password.as_bytes(), &salt)
                    .map_err(|e| ServiceError::Internal(e.to_string()))?
                    .to_string();
                Some(hash)
            }
            _ => None,
        };
        let password_set = password_hash.is_some();

        let record = TokenRecord {
            token: token.clone(),
            connect: connect.clone(),
            refresh_token: connect.clone(),
            domains: domains.clone(),
            backup,
            password_hash,
        };
        self.repo.insert_token(record).await?;

        info!(connect = %connect, backup, domains = domains.len(), "token_issued");
        Ok(IssuedToken {
            token,
            refresh_token: connect,
            domains,
            backup,
            password: password_set,
        })
    }

    /// Resolve a bearer token to its identity record. Every other operation
    /// starts here.
    pub async fn resolve(&self, token: &str) -> Result<TokenRecord, ServiceError> {
        self.repo
            .find_token(token)
            .await?
            .ok_or_else(|| ServiceError::not_found("token"))
    }

    /// Rotate the bearer token. Requires the stored refresh token; leaves
    /// `connect`, domains, backup flag and password hash untouched.
    #[instrument(skip(self, token, presented_refresh))]
    pub async fn rotate(
        &self,
        token: &str,
        presented_refresh: Option<&str>,
    ) -> Result<String, ServiceError> {
        let record = self.resolve(token).await?;
        match presented_refresh {
            Some(presented) if presented == record.refresh_token => {}
            _ => return Err(ServiceError::Unauthorized("refresh token mismatch".into())),
        }

        let new_token = Uuid::new_v4().to_string();
        self.repo.update_token_value(&record.connect, &new_token).await?;
        info!(connect = %record.connect, "token_rotated");
        Ok(new_token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::domain::DomainRule;
    use crate::store::repository::mock::MockStorageRepository;

    fn registry() -> TokenRegistry<MockStorageRepository> {
        TokenRegistry::new(Arc::new(MockStorageRepository::default()))
    }

    #[tokio::test]
    async fn issue_returns_unique_ids_and_refresh_equals_connect() {
        let repo = Arc::new(MockStorageRepository::default());
        let registry = TokenRegistry::new(Arc::clone(&repo));

        let a = registry.issue(CreateTokenInput::default(), None).await.unwrap();
        let b = registry.issue(CreateTokenInput::default(), None).await.unwrap();

        assert_ne!(a.token, b.token);
        assert_ne!(a.token, a.refresh_token);

        let record = registry.resolve(&a.token).await.unwrap();
        assert_eq!(record.refresh_token, record.connect);
        assert_ne!(record.connect, registry.resolve(&b.token).await.unwrap().connect);
    }

    #[tokio::test]
    async fn issue_hashes_password_and_reports_presence_only() {
        let registry = registry();
        let input = CreateTokenInput { password: Some("s3cret".into()), ..Default::default() };
        let issued = registry.issue(input, None).await.unwrap();
        assert!(issued.password);

        let record = registry.resolve(&issued.token).await.unwrap();
        let hash = record.password_hash.unwrap();
        assert_ne!(hash, "s3cret");
        assert!(hash.starts_with("$argon2"));
    }

    #[tokio::test]
    async fn issue_with_bool_domain_uses_caller_host() {
        let registry = registry();
        let input = CreateTokenInput {
            domains: Some(DomainRule::UseRequestHost(true)),
            ..Default::default()
        };
        let issued = registry.issue(input, Some("example.com")).await.unwrap();
        assert_eq!(issued.domains, vec!["example.com".to_string()]);
    }

    #[tokio::test]
    async fn resolve_unknown_token_is_not_found() {
        let registry = registry();
        let err = registry.resolve("nope").await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn rotate_changes_token_only() {
        let registry = registry();
        let input = CreateTokenInput {
            domains: Some(DomainRule::One("example.com".into())),
            backup: Some(true),
            password: Some("pw".into()),
        };
        let issued = registry.issue(input, None).await.unwrap();
        let before = registry.resolve(&issued.token).await.unwrap();

        let new_token = registry
            .rotate(&issued.token, Some(&issued.refresh_token))
            .await
            .unwrap();
        assert_ne!(new_token, issued.token);

        // Old token no longer resolves; new one carries the same identity.
        assert!(registry.resolve(&issued.token).await.is_err());
        let after = registry.resolve(&new_token).await.unwrap();
        assert_eq!(after.connect, before.connect);
        assert_eq!(after.refresh_token, before.refresh_token);
        assert_eq!(after.domains, before.domains);
        assert_eq!(after.backup, before.backup);
        assert_eq!(after.password_hash, before.password_hash);
    }

    #[tokio::test]
    async fn rotate_with_wrong_refresh_is_unauthorized() {
        let registry = registry();
        let issued = registry.issue(CreateTokenInput::default(), None).await.unwrap();

        let err = registry.rotate(&issued.token, Some("wrong")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));
        let err = registry.rotate(&issued.token, None).await.unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));

        // Token unchanged after failed rotations.
        assert!(registry.resolve(&issued.token).await.is_ok());
    }

    #[tokio::test]
    async fn rotate_unknown_token_is_not_found() {
        let registry = registry();
        let err = registry.rotate("missing", Some("x")).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }
}
