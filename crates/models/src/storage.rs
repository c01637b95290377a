use sea_orm::{entity::prelude::*, Set, DatabaseConnection};
use uuid::Uuid;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::errors;

/// Tenant document: one JSON object per `connect`. The row exists only after
/// the first successful write; absence means "empty store".
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "storage")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub connect: String,
    pub data: Json,
    pub updated_at: DateTimeWithTimeZone,
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
) -> Result<Model, errors::ModelError> {
    if connect.trim().is_empty() { return Err(errors::ModelError::Validation("connect required".into())); }
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        connect: Set(connect.to_string()),
        data: Set(data),
        updated_at: Set(Utc::now().into()),
    };
    am.insert(db).await.map_err(|e| errors::ModelError::Db(e.to_string()))
}

pub async fn update_data(
    db: &DatabaseConnection,
    connect: &str,
    data: serde_json::Value,
) -> Result<Model, errors::ModelError> {
    let found = Entity::find()
        .filter(Column::Connect.eq(connect))
        .one(db)
        .await
        .map_err(|e| errors::ModelError::Db(e.to_string()))?
        .ok_or_else(|| errors::ModelError::Validation("storage not found".into()))?;
    let mut am: ActiveModel = found.into();
    am.data = Set(data);
    am.updated_at = Set(Utc::now().into());
    am.update(db).await.map_err(|e| errors::ModelError::Db(e.to_string()))
}

pub async fn delete_by_connect(db: &DatabaseConnection, connect: &str) -> Result<u64, errors::ModelError> {
    let res = Entity::delete_many()
        .filter(Column::Connect.eq(connect))
        .exec(db)
        .await
        .map_err(|e| errors::ModelError::Db(e.to_string()))?;
    Ok(res.rows_affected)
}
