//! Persistence boundary: domain records, the repository trait, and its
//! implementations (in-memory mock, SeaORM).

pub mod domain;
pub mod repository;
pub mod repo;

pub use domain::{BackupRecord, CreateTokenInput, Document, DomainRule, IssuedToken, TokenRecord};
pub use repository::StorageRepository;
