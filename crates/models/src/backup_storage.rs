use sea_orm::{entity::prelude::*, Set, DatabaseConnection};
use uuid::Uuid;
use serde::{Deserialize, Serialize};

use crate::errors;

/// Immutable snapshot of a tenant document. `date` is Unix milliseconds and
/// doubles as the snapshot handle within a `connect`; pinned rows
/// (`important = true`) are exempt from retention.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "backup_storage")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub connect: String,
    pub data: Json,
    pub date: i64,
    pub important: bool,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef { panic!("no relations defined here") }
}

impl ActiveModelBehavior for ActiveModel {}

pub async fn create(
    db: &DatabaseConnection,
    connect: &str,
    data: serde_json::Value,
    date: i64,
) -> Result<Model, errors::ModelError> {
    if connect.trim().is_empty() { return Err(errors::ModelError::Validation("connect required".into())); }
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        connect: Set(connect.to_string()),
        data: Set(data),
        date: Set(date),
        important: Set(false),
    };
    am.insert(db).await.map_err(|e| errors::ModelError::Db(e.to_string()))
}
