use serde::{Deserialize, Serialize};

/// Tenant document payload: string key to arbitrary JSON value. The store is
/// schema-agnostic; values are never inspected beyond the falsy-absence test
/// in the storage engine.
pub type Document = serde_json::Map<String, serde_json::Value>;

/// Identity record (business view).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenRecord {
    pub token: String,
    pub connect: String,
    pub refresh_token: String,
    pub domains: Vec<String>,
    pub backup: bool,
    pub password_hash: Option<String>,
}

/// Immutable dated snapshot of a tenant document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupRecord {
    pub connect: String,
    pub data: Document,
    /// Unix milliseconds; doubles as the snapshot handle within a `connect`.
    pub date: i64,
    pub important: bool,
}

/// Domain allow-list shorthand accepted at creation: a single domain, a list
/// of domains, or a boolean meaning "use the requesting caller's own host".
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DomainRule {
    UseRequestHost(bool),
    One(String),
    Many(Vec<String>),
}

impl DomainRule {
    /// Resolve the shorthand to the concrete allow-list.
    pub fn resolve(self, request_host: Option<&str>) -> Vec<String> {
        match self {
            DomainRule::UseRequestHost(true) => {
                request_host.map(|h| vec![h.to_string()]).unwrap_or_default()
            }
            DomainRule::UseRequestHost(false) => Vec::new(),
            DomainRule::One(domain) => vec![domain],
            DomainRule::Many(domains) => domains,
        }
    }
}

/// Creation policy carried by the create-identity request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateTokenInput {
    pub domains: Option<DomainRule>,
    pub backup: Option<bool>,
    pub password: Option<String>,
}

/// What creation returns to the caller: the credentials plus the policy
/// fields actually applied. The password comes back only as a presence flag.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    pub token: String,
    #[serde(rename = "refreshToken")]
    pub refresh_token: String,
    pub domains: Vec<String>,
    pub backup: bool,
    pub password: bool,
}
