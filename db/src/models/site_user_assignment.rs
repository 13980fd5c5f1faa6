use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::AssignmentError;
use crate::models::{site, user};

/// Join entity linking a user to a site, either as a worker or as the site
/// coordinator. A user may hold assignments on several sites; the exact
/// (site_id, user_id) pair must not repeat, which the service layer checks
/// before every insert.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "site_user_assignments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub site_id: i64,
    pub user_id: i64,
    pub assigned_role: AssignedRole,
    pub assigned_at: DateTime<Utc>,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Display, EnumString,
    Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "assigned_role_type")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum AssignedRole {
    #[sea_orm(string_value = "worker")]
    Worker,

    #[sea_orm(string_value = "sitecoordinator")]
    SiteCoordinator,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::site::Entity",
        from = "Column::SiteId",
        to = "super::site::Column::Id",
        on_delete = "Cascade"
    )]
    Site,

    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::site::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Site.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Assigns a user to a site. A second assignment of the same user to the
    /// same site is rejected, whatever its role.
    pub async fn assign(
        db: &DbConn,
        site_id: i64,
        user_id: i64,
        role: AssignedRole,
    ) -> Result<Model, AssignmentError> {
        let existing = Entity::find()
            .filter(Column::SiteId.eq(site_id))
            .filter(Column::UserId.eq(user_id))
            .one(db)
            .await?;

        if existing.is_some() {
            return Err(AssignmentError::AlreadyAssigned);
        }

        let assignment = ActiveModel {
            site_id: Set(site_id),
            user_id: Set(user_id),
            assigned_role: Set(role),
            assigned_at: Set(Utc::now()),
            ..Default::default()
        };

        Ok(assignment.insert(db).await?)
    }

    /// Removes a user's assignment to a site; missing assignments are a
    /// rejected operation, not a no-op.
    pub async fn unassign(db: &DbConn, site_id: i64, user_id: i64) -> Result<(), AssignmentError> {
        let assignment = Entity::find()
            .filter(Column::SiteId.eq(site_id))
            .filter(Column::UserId.eq(user_id))
            .one(db)
            .await?
            .ok_or(AssignmentError::NotAssigned)?;

        Entity::delete_by_id(assignment.id).exec(db).await?;
        Ok(())
    }

    /// Every user (worker or coordinator) assigned to a site, with the
    /// joined user record.
    pub async fn users_for_site(
        db: &DbConn,
        site_id: i64,
    ) -> Result<Vec<(Model, user::Model)>, DbErr> {
        let rows = Entity::find()
            .filter(Column::SiteId.eq(site_id))
            .find_also_related(user::Entity)
            .all(db)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(a, u)| u.map(|u| (a, u)))
            .collect())
    }

    /// The first assignment found for a user, with its site. The data model
    /// permits several; only one is surfaced here.
    pub async fn first_for_user(
        db: &DbConn,
        user_id: i64,
    ) -> Result<Option<(Model, site::Model)>, DbErr> {
        let row = Entity::find()
            .filter(Column::UserId.eq(user_id))
            .find_also_related(site::Entity)
            .one(db)
            .await?;

        Ok(row.and_then(|(a, s)| s.map(|s| (a, s))))
    }

    pub async fn site_ids_for_user(db: &DbConn, user_id: i64) -> Result<Vec<i64>, DbErr> {
        Ok(Entity::find()
            .filter(Column::UserId.eq(user_id))
            .all(db)
            .await?
            .into_iter()
            .map(|a| a.site_id)
            .collect())
    }

    /// Ids of every user assigned to a site, used to expand the `all`
    /// worker selector on filtered attendance queries.
    pub async fn user_ids_for_site(db: &DbConn, site_id: i64) -> Result<Vec<i64>, DbErr> {
        Ok(Entity::find()
            .filter(Column::SiteId.eq(site_id))
            .all(db)
            .await?
            .into_iter()
            .map(|a| a.user_id)
            .collect())
    }
}
