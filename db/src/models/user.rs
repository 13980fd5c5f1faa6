use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use chrono::{DateTime, Utc};
use rand::rngs::OsRng;
use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveModelTrait, QueryOrder};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::models::site_user_assignment::Entity as AssignmentEntity;

/// Represents an account in the `users` table. Identity is the
/// (country_code, mobile_number) pair, unique at the store level.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub country_code: String,
    pub mobile_number: String,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub full_name: Option<String>,
    pub role: Role,
    pub profile_image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

/// Closed set of account roles. Unknown strings are a parse error at the
/// boundary, never silently coerced.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Display, EnumString,
    Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "user_role_type")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Role {
    #[sea_orm(string_value = "worker")]
    Worker,

    #[sea_orm(string_value = "site_coordinator")]
    SiteCoordinator,

    #[sea_orm(string_value = "admin")]
    Admin,
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
    pub async fn create(
        db: &DbConn,
        country_code: &str,
        mobile_number: &str,
        password: &str,
        full_name: Option<&str>,
        role: Role,
        profile_image_url: Option<&str>,
    ) -> Result<Model, DbErr> {
        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| DbErr::Custom(format!("Failed to hash password: {e}")))?
            .to_string();

        let now = Utc::now();
        let user = ActiveModel {
            country_code: Set(country_code.to_owned()),
            mobile_number: Set(mobile_number.to_owned()),
            password_hash: Set(Some(password_hash)),
            full_name: Set(full_name.map(str::to_owned)),
            role: Set(role),
            profile_image_url: Set(profile_image_url.map(str::to_owned)),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        user.insert(db).await
    }

    /// Constant-ish password check against the stored argon2 hash. Accounts
    /// created without a password never verify.
    pub fn verify_password(&self, password: &str) -> bool {
        let Some(hash) = self.password_hash.as_deref() else {
            return false;
        };
        let Ok(parsed) = PasswordHash::new(hash) else {
            return false;
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }

    /// Looks a user up by mobile number, preferring an exact
    /// (country_code, mobile_number) match when a country code is given.
    pub async fn find_by_mobile(
        db: &DbConn,
        country_code: Option<&str>,
        mobile_number: &str,
    ) -> Result<Option<Model>, DbErr> {
        if let Some(cc) = country_code {
            let exact = Entity::find()
                .filter(Column::CountryCode.eq(cc))
                .filter(Column::MobileNumber.eq(mobile_number))
                .one(db)
                .await?;
            if exact.is_some() {
                return Ok(exact);
            }
        }

        Entity::find()
            .filter(Column::MobileNumber.eq(mobile_number))
            .one(db)
            .await
    }

    pub async fn touch_last_login(db: &DbConn, id: i64) -> Result<Model, DbErr> {
        let user = ActiveModel {
            id: Set(id),
            last_login_at: Set(Some(Utc::now())),
            updated_at: Set(Utc::now()),
            ..Default::default()
        };
        user.update(db).await
    }

    /// Workers with no assignment row at all, computed as the set-difference
    /// between all workers and all assigned user ids.
    pub async fn unassigned_workers(db: &DbConn) -> Result<Vec<Model>, DbErr> {
        let assigned_ids: Vec<i64> = AssignmentEntity::find()
            .all(db)
            .await?
            .into_iter()
            .map(|a| a.user_id)
            .collect();

        let mut query = Entity::find().filter(Column::Role.eq(Role::Worker));
        if !assigned_ids.is_empty() {
            query = query.filter(Column::Id.is_not_in(assigned_ids));
        }

        query.order_by_asc(Column::FullName).all(db).await
    }

    pub async fn site_coordinators(db: &DbConn) -> Result<Vec<Model>, DbErr> {
        Entity::find()
            .filter(Column::Role.eq(Role::SiteCoordinator))
            .order_by_asc(Column::FullName)
            .all(db)
            .await
    }

    /// Ids of every admin account; used by announcement visibility scoping.
    pub async fn admin_ids(db: &DbConn) -> Result<Vec<i64>, DbErr> {
        Ok(Entity::find()
            .filter(Column::Role.eq(Role::Admin))
            .all(db)
            .await?
            .into_iter()
            .map(|u| u.id)
            .collect())
    }
}
