use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;
use sea_orm::{Condition, IntoActiveModel, QueryOrder};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use strum::{Display, EnumString};

use crate::error::AnnouncementError;
use crate::models::{site, site_user_assignment, user};

/// A message posted to one site, or to every site when `site_id` is null.
/// Deactivation is one-way; expired announcements stay in the store and are
/// filtered out at read time.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "announcements")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub title: String,
    pub message: String,
    pub priority: Priority,
    /// Null means global: visible on every site.
    pub site_id: Option<i64>,
    pub created_by: i64,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Closed priority set. Anything else is rejected at the boundary, so rank
/// ordering never has to deal with an unknown value.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Display, EnumString,
    Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "announcement_priority_type")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Priority {
    #[sea_orm(string_value = "low")]
    Low,

    #[sea_orm(string_value = "medium")]
    Medium,

    #[sea_orm(string_value = "high")]
    High,
}

impl Priority {
    /// Sort key: high outranks medium outranks low.
    pub fn rank(self) -> u8 {
        match self {
            Priority::High => 0,
            Priority::Medium => 1,
            Priority::Low => 2,
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::site::Entity",
        from = "Column::SiteId",
        to = "super::site::Column::Id"
    )]
    Site,

    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::CreatedBy",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Creator,
}

impl Related<super::site::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Site.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Creator.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Feed entry joined with site and author names.
#[derive(Debug, Serialize)]
pub struct AnnouncementView {
    pub id: i64,
    pub title: String,
    pub message: String,
    pub priority: Priority,
    pub site_id: Option<i64>,
    pub site_name: Option<String>,
    pub created_by: i64,
    pub created_by_name: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// An author's own announcement, expired ones included, with the expiry
/// state precomputed.
#[derive(Debug, Serialize)]
pub struct MyAnnouncement {
    #[serde(flatten)]
    pub announcement: Model,
    pub site_name: Option<String>,
    pub is_expired: bool,
}

/// Scope filter for an author's own announcements.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SiteFilter {
    /// No filtering.
    Any,
    /// Global announcements only.
    GlobalOnly,
    Site(i64),
}

impl Model {
    /// Posts an announcement. `priority` arrives as free text from the
    /// boundary and must name one of the known levels.
    pub async fn create(
        db: &DbConn,
        title: &str,
        message: &str,
        priority: &str,
        site_id: Option<i64>,
        created_by: i64,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<Model, AnnouncementError> {
        let priority =
            Priority::from_str(priority.trim()).map_err(|_| AnnouncementError::InvalidPriority)?;

        let now = Utc::now();
        let announcement = ActiveModel {
            title: Set(title.trim().to_owned()),
            message: Set(message.trim().to_owned()),
            priority: Set(priority),
            site_id: Set(site_id),
            created_by: Set(created_by),
            expires_at: Set(expires_at),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        Ok(announcement.insert(db).await?)
    }

    /// The feed a user sees. Workers and coordinators get announcements for
    /// their assigned sites plus global ones; admins get everything authored
    /// by an admin account. Inactive and expired entries never appear.
    ///
    /// Ordering is priority rank first, then newest first within a rank.
    pub async fn for_user(
        db: &DbConn,
        user_id: i64,
        role: user::Role,
    ) -> Result<Vec<AnnouncementView>, AnnouncementError> {
        let now = Utc::now();

        let scope = match role {
            user::Role::Admin => {
                let admin_ids = user::Model::admin_ids(db).await?;
                if admin_ids.is_empty() {
                    return Ok(vec![]);
                }
                Condition::all().add(Column::CreatedBy.is_in(admin_ids))
            }
            _ => {
                let site_ids =
                    site_user_assignment::Model::site_ids_for_user(db, user_id).await?;
                let mut scope = Condition::any().add(Column::SiteId.is_null());
                if !site_ids.is_empty() {
                    scope = scope.add(Column::SiteId.is_in(site_ids));
                }
                scope
            }
        };

        let mut rows = Entity::find()
            .filter(Column::IsActive.eq(true))
            .filter(
                Condition::any()
                    .add(Column::ExpiresAt.is_null())
                    .add(Column::ExpiresAt.gte(now)),
            )
            .filter(scope)
            .all(db)
            .await?;

        // Two-key sort done in memory; the priority column holds words, not
        // ranks, so the store cannot order it meaningfully.
        rows.sort_by(|a, b| {
            a.priority
                .rank()
                .cmp(&b.priority.rank())
                .then(b.created_at.cmp(&a.created_at))
        });

        Self::enrich(db, rows).await
    }

    /// Everything a user has authored, newest first, optionally narrowed to
    /// one site or to global posts. Expired and inactive entries are kept so
    /// authors can see the full history.
    pub async fn mine(
        db: &DbConn,
        created_by: i64,
        filter: SiteFilter,
    ) -> Result<Vec<MyAnnouncement>, AnnouncementError> {
        let mut query = Entity::find().filter(Column::CreatedBy.eq(created_by));
        query = match filter {
            SiteFilter::Any => query,
            SiteFilter::GlobalOnly => query.filter(Column::SiteId.is_null()),
            SiteFilter::Site(id) => query.filter(Column::SiteId.eq(id)),
        };

        let rows = query.order_by_desc(Column::CreatedAt).all(db).await?;
        let sites = Self::site_names(db, &rows).await?;

        let now = Utc::now();
        Ok(rows
            .into_iter()
            .map(|a| MyAnnouncement {
                site_name: a.site_id.and_then(|id| sites.get(&id).cloned()),
                is_expired: a.expires_at.is_some_and(|exp| exp < now),
                announcement: a,
            })
            .collect())
    }

    /// Turns an announcement off. Only its author may do this; the role of
    /// the caller grants no override. Already-inactive entries deactivate
    /// again without complaint.
    pub async fn deactivate(
        db: &DbConn,
        id: i64,
        requesting_user_id: i64,
    ) -> Result<Model, AnnouncementError> {
        let announcement = Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or(AnnouncementError::NotFound)?;

        if announcement.created_by != requesting_user_id {
            return Err(AnnouncementError::NotAuthorized);
        }

        let mut active = announcement.into_active_model();
        active.is_active = Set(false);
        active.updated_at = Set(Utc::now());
        Ok(active.update(db).await?)
    }

    async fn site_names(db: &DbConn, rows: &[Model]) -> Result<HashMap<i64, String>, DbErr> {
        let site_ids: Vec<i64> = rows.iter().filter_map(|a| a.site_id).collect();
        if site_ids.is_empty() {
            return Ok(HashMap::new());
        }

        Ok(site::Entity::find()
            .filter(site::Column::Id.is_in(site_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|s| (s.id, s.name))
            .collect())
    }

    async fn enrich(db: &DbConn, rows: Vec<Model>) -> Result<Vec<AnnouncementView>, AnnouncementError> {
        let sites = Self::site_names(db, &rows).await?;

        let author_ids: Vec<i64> = rows.iter().map(|a| a.created_by).collect();
        let authors: HashMap<i64, Option<String>> = if author_ids.is_empty() {
            HashMap::new()
        } else {
            user::Entity::find()
                .filter(user::Column::Id.is_in(author_ids))
                .all(db)
                .await?
                .into_iter()
                .map(|u| (u.id, u.full_name))
                .collect()
        };

        Ok(rows
            .into_iter()
            .map(|a| AnnouncementView {
                site_name: a.site_id.and_then(|id| sites.get(&id).cloned()),
                created_by_name: authors.get(&a.created_by).cloned().flatten(),
                id: a.id,
                title: a.title,
                message: a.message,
                priority: a.priority,
                site_id: a.site_id,
                created_by: a.created_by,
                expires_at: a.expires_at,
                created_at: a.created_at,
            })
            .collect())
    }
}
