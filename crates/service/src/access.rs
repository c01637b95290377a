//! Stateless policy checks composed by every mutating operation. Token
//! resolution must happen first (it produces the record these consume);
//! beyond that the checks are independent and order-insensitive. Reads
//! intentionally skip all of them once the bearer token is known.

use argon2::{Argon2, PasswordHash, password_hash::PasswordVerifier};

use crate::errors::ServiceError;
use crate::store::domain::TokenRecord;

/// Domain gate: an empty allow-list means unrestricted; otherwise the
/// request host must be a member.
pub fn verify_domain(request_host: Option<&str>, allowed: &[String]) -> Result<(), ServiceError> {
    if allowed.is_empty() {
        return Ok(());
    }
    match request_host {
        Some(host) if allowed.iter().any(|d| d == host) => Ok(()),
        _ => Err(ServiceError::Forbidden("domain not allowed".into())),
    }
}

/// Password gate: passes trivially when the identity has no password set.
pub fn verify_password(record: &TokenRecord, presented: Option<&str>) -> Result<(), ServiceError> {
    let Some(hash) = record.password_hash.as_deref() else {
        return Ok(());
    };
    let Some(presented) = presented else {
        return Err(ServiceError::Unauthorized("password required".into()));
    };
    let parsed = PasswordHash::new(hash).map_err(|e| ServiceError::Internal(e.to_string()))?;
    if Argon2::default().verify_password(presented.as_bytes(), &parsed).is_err() {
        return Err(ServiceError::Unauthorized("wrong password".into()));
    }
    Ok(())
}

/// Backup gate: backup-management operations require the backup flag.
pub fn verify_backup_enabled(record: &TokenRecord) -> Result<(), ServiceError> {
    if record.backup {
        Ok(())
    } else {
        Err(ServiceError::Forbidden("backup is not enabled for this token".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use argon2::password_hash::{PasswordHasher, SaltString};
    use rand::rngs::OsRng;

    fn record(domains: Vec<String>, backup: bool, password: Option<&str>) -> TokenRecord {
        let password_hash = password.map(|p| {
            let salt = SaltString::generate(&mut OsRng);
            Argon2::default().hash_password(p.as_bytes(), &salt).unwrap().to_string()
        });
        TokenRecord {
            token: "t".into(),
            connect: "c".into(),
            refresh_token: "c".into(),
            domains,
            backup,
            password_hash,
        }
    }

    #[test]
    fn empty_allow_list_accepts_any_host() {
        assert!(verify_domain(Some("anything.io"), &[]).is_ok());
        assert!(verify_domain(None, &[]).is_ok());
    }

    #[test]
    fn allow_list_rejects_other_hosts() {
        let allowed = vec!["example.com".to_string()];
        assert!(verify_domain(Some("example.com"), &allowed).is_ok());
        assert!(matches!(
            verify_domain(Some("evil.io"), &allowed),
            Err(ServiceError::Forbidden(_))
        ));
        assert!(matches!(verify_domain(None, &allowed), Err(ServiceError::Forbidden(_))));
    }

    #[test]
    fn no_password_accepts_anything() {
        let record = record(vec![], false, None);
        assert!(verify_password(&record, None).is_ok());
        assert!(verify_password(&record, Some("whatever")).is_ok());
    }

    #[test]
    fn password_gate_requires_exact_match() {
        let record = record(vec![], false, Some("s3cret"));
        assert!(verify_password(&record, Some("s3cret")).is_ok());
        assert!(matches!(
            verify_password(&record, Some("wrong")),
            Err(ServiceError::Unauthorized(_))
        ));
        assert!(matches!(verify_password(&record, None), Err(ServiceError::Unauthorized(_))));
    }

    #[test]
    fn backup_gate_follows_flag() {
        assert!(verify_backup_enabled(&record(vec![], true, None)).is_ok());
        assert!(matches!(
            verify_backup_enabled(&record(vec![], false, None)),
            Err(ServiceError::Forbidden(_))
        ));
    }
}
