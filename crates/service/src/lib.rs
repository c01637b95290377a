//! Service layer: the access-control and storage-lifecycle engine.
//! - Token issuance, resolution and rotation (`tokens`)
//! - Pure policy checks composed by mutating operations (`access`)
//! - Scoped document read/merge/delete semantics (`storage`)
//! - Periodic snapshots, retention and restore (`backup`, `restore`)
//! - Persistence behind a repository trait with mock and SeaORM impls (`store`)

pub mod errors;
pub mod store;
pub mod tokens;
pub mod access;
pub mod storage;
pub mod backup;
pub mod restore;
