use sea_orm::{entity::prelude::*, Set, DatabaseConnection};
use uuid::Uuid;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::errors;

/// Identity record: bearer token plus the access policy attached to it.
/// `connect` binds the token to its storage document and backup history and
/// never changes; `token` is the only field mutated after creation (rotation).
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "token")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub token: String,
    pub connect: String,
    pub refresh_token: String,
    pub domains: Json,
    pub backup: bool,
    pub password_hash: Option<String>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef { panic!("no relations defined here") }
}

impl ActiveModelBehavior for ActiveModel {}

#[allow(clippy::too_many_arguments)]
pub async fn create(
    db: &DatabaseConnection,
    token: &str,
    connect: &str,
    refresh_token: &str,
    domains: Vec<String>,
    backup: bool,
    password_hash: Option<String>,
) -> Result<Model, errors::ModelError> {
    if token.trim().is_empty() { return Err(errors::ModelError::Validation("token required".into())); }
    if connect.trim().is_empty() { return Err(errors::ModelError::Validation("connect required".into())); }
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        token: Set(token.to_string()),
        connect: Set(connect.to_string()),
        refresh_token: Set(refresh_token.to_string()),
        domains: Set(serde_json::json!(domains)),
        backup: Set(backup),
        password_hash: Set(password_hash),
        created_at: Set(Utc::now().into()),
    };
    am.insert(db).await.map_err(|e| errors::ModelError::Db(e.to_string()))
}

/// Persist a rotated bearer token for the identity named by `connect`.
pub async fn update_token(
    db: &DatabaseConnection,
    connect: &str,
    new_token: &str,
) -> Result<Model, errors::ModelError> {
    let found = Entity::find()
        .filter(Column::Connect.eq(connect))
        .one(db)
        .await
        .map_err(|e| errors::ModelError::Db(e.to_string()))?
        .ok_or_else(|| errors::ModelError::Validation("token identity not found".into()))?;
    let mut am: ActiveModel = found.into();
    am.token = Set(new_token.to_string());
    am.update(db).await.map_err(|e| errors::ModelError::Db(e.to_string()))
}
