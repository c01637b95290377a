pub mod errors;
pub mod db;
pub mod token;
pub mod storage;
pub mod backup_storage;
