use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Identity records are provisioned by the external auth service; this
/// service only reads them to resolve team member references into
/// display identities.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub username: String,
    pub display_name: Option<String>,
    pub email: Option<String>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
