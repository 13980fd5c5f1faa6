use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::SiteError;
use crate::models::site_user_assignment::{
    AssignedRole, Column as AssignmentColumn, Entity as AssignmentEntity,
};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "sites")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Optional human-readable code, unique when present.
    pub code: Option<String>,
    pub name: String,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::site_user_assignment::Entity")]
    Assignments,
}

impl Related<super::site_user_assignment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Assignments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Creates a site. The code, when supplied, must be unique; the store
    /// also enforces this with a unique index.
    pub async fn create(
        db: &DbConn,
        code: Option<&str>,
        name: &str,
        address: Option<&str>,
        latitude: Option<f64>,
        longitude: Option<f64>,
    ) -> Result<Model, SiteError> {
        if let Some(code) = code {
            let existing = Entity::find()
                .filter(Column::Code.eq(code))
                .one(db)
                .await?;
            if existing.is_some() {
                return Err(SiteError::DuplicateCode);
            }
        }

        let now = Utc::now();
        let site = ActiveModel {
            code: Set(code.map(str::to_owned)),
            name: Set(name.trim().to_owned()),
            address: Set(address.map(|a| a.trim().to_owned()).filter(|a| !a.is_empty())),
            latitude: Set(latitude),
            longitude: Set(longitude),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        Ok(site.insert(db).await?)
    }

    pub async fn all(db: &DbConn) -> Result<Vec<Model>, DbErr> {
        Entity::find().all(db).await
    }

    /// Sites the given user holds an assignment on, in assignment order.
    pub async fn for_user(db: &DbConn, user_id: i64) -> Result<Vec<Model>, DbErr> {
        let assignments = AssignmentEntity::find()
            .filter(AssignmentColumn::UserId.eq(user_id))
            .find_also_related(Entity)
            .all(db)
            .await?;

        Ok(assignments
            .into_iter()
            .filter_map(|(_, site)| site)
            .collect())
    }

    /// Sites lacking any assignment row with the coordinator role.
    pub async fn without_coordinator(db: &DbConn) -> Result<Vec<Model>, DbErr> {
        let coordinated_ids: Vec<i64> = AssignmentEntity::find()
            .filter(AssignmentColumn::AssignedRole.eq(AssignedRole::SiteCoordinator))
            .all(db)
            .await?
            .into_iter()
            .map(|a| a.site_id)
            .collect();

        let mut query = Entity::find();
        if !coordinated_ids.is_empty() {
            query = query.filter(Column::Id.is_not_in(coordinated_ids));
        }
        query.all(db).await
    }
}
