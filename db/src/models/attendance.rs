use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveModelTrait, IntoActiveModel, QueryOrder};
use serde::Serialize;
use std::collections::HashMap;
use util::dates::{elapsed_hours, end_of_day, start_of_day};

use crate::error::AttendanceError;
use crate::models::{site, site_user_assignment, user};

/// One row per (worker_id, date), enforced by a unique index. A row with
/// `punch_in_time` set and `punch_out_time` null means the worker is
/// currently on site. Rows are never deleted.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "attendance")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub worker_id: i64,
    pub site_id: Option<i64>,
    /// Day key, truncated to 00:00:00 UTC.
    pub date: DateTime<Utc>,

    pub punch_in_time: Option<DateTime<Utc>>,
    pub punch_in_latitude: Option<f64>,
    pub punch_in_longitude: Option<f64>,
    pub punch_in_selfie_url: Option<String>,

    pub punch_out_time: Option<DateTime<Utc>>,
    pub punch_out_latitude: Option<f64>,
    pub punch_out_longitude: Option<f64>,
    pub punch_out_selfie_url: Option<String>,

    /// Frozen at punch-out; null while on site.
    pub total_hours: Option<f64>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::WorkerId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Worker,

    #[sea_orm(
        belongs_to = "super::site::Entity",
        from = "Column::SiteId",
        to = "super::site::Column::Id"
    )]
    Site,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Worker.def()
    }
}

impl Related<super::site::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Site.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Today's punch state for a worker. Absence of a record is a valid state,
/// not an error.
#[derive(Debug, Default, Serialize)]
pub struct TodayStatus {
    pub has_punched_in: bool,
    pub has_punched_out: bool,
    pub punch_in_time: Option<DateTime<Utc>>,
    pub punch_out_time: Option<DateTime<Utc>>,
}

/// Worker filter for cross-worker attendance queries.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkerSelector {
    /// Every worker currently assigned to the queried site.
    All,
    /// The requesting user only.
    Myself,
    One(i64),
    Many(Vec<i64>),
}

/// Read-side projection of an attendance row joined with worker and site
/// names. Nothing here is stored.
#[derive(Debug, Serialize)]
pub struct FilteredRecord {
    pub id: i64,
    pub worker_id: i64,
    pub worker_name: Option<String>,
    pub worker_role: Option<user::Role>,
    pub site_id: Option<i64>,
    pub site_name: Option<String>,
    pub site_code: Option<String>,
    pub date: DateTime<Utc>,
    pub punch_in_time: Option<DateTime<Utc>>,
    pub punch_in_latitude: Option<f64>,
    pub punch_in_longitude: Option<f64>,
    pub punch_in_selfie_url: Option<String>,
    pub punch_out_time: Option<DateTime<Utc>>,
    pub punch_out_latitude: Option<f64>,
    pub punch_out_longitude: Option<f64>,
    pub punch_out_selfie_url: Option<String>,
    pub total_hours: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Model {
    async fn find_for_day(
        db: &DbConn,
        worker_id: i64,
        day: DateTime<Utc>,
    ) -> Result<Option<Model>, DbErr> {
        Entity::find()
            .filter(Column::WorkerId.eq(worker_id))
            .filter(Column::Date.eq(day))
            .one(db)
            .await
    }

    /// Records a punch-in for today. At most one row per worker per day can
    /// exist; a second call on the same day is rejected with the existing
    /// row attached for client context.
    pub async fn punch_in(
        db: &DbConn,
        worker_id: i64,
        site_id: Option<i64>,
        latitude: f64,
        longitude: f64,
        selfie_url: &str,
    ) -> Result<Model, AttendanceError> {
        // Reject unknown sites up front to avoid FK violations. Admins may
        // punch in without a site.
        if let Some(site_id) = site_id {
            let site = site::Entity::find_by_id(site_id).one(db).await?;
            if site.is_none() {
                return Err(AttendanceError::SiteNotFound);
            }
        }

        let now = Utc::now();
        let today = start_of_day(now);

        if let Some(existing) = Self::find_for_day(db, worker_id, today).await? {
            if existing.punch_in_time.is_some() {
                return Err(AttendanceError::AlreadyPunchedIn(existing));
            }

            // Row exists but was never punched in; fill it in place.
            let mut active = existing.into_active_model();
            active.punch_in_time = Set(Some(now));
            active.punch_in_latitude = Set(Some(latitude));
            active.punch_in_longitude = Set(Some(longitude));
            active.punch_in_selfie_url = Set(Some(selfie_url.to_owned()));
            active.updated_at = Set(now);
            return Ok(active.update(db).await?);
        }

        let record = ActiveModel {
            worker_id: Set(worker_id),
            site_id: Set(site_id),
            date: Set(today),
            punch_in_time: Set(Some(now)),
            punch_in_latitude: Set(Some(latitude)),
            punch_in_longitude: Set(Some(longitude)),
            punch_in_selfie_url: Set(Some(selfie_url.to_owned())),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        match record.insert(db).await {
            Ok(row) => Ok(row),
            // A concurrent punch-in can win the unique (worker_id, date)
            // race between our read and this insert; re-read and surface
            // the row that got there first.
            Err(insert_err) => match Self::find_for_day(db, worker_id, today).await? {
                Some(existing) if existing.punch_in_time.is_some() => {
                    Err(AttendanceError::AlreadyPunchedIn(existing))
                }
                _ => Err(insert_err.into()),
            },
        }
    }

    /// Records a punch-out for today and freezes `total_hours`.
    pub async fn punch_out(
        db: &DbConn,
        worker_id: i64,
        latitude: f64,
        longitude: f64,
        selfie_url: &str,
    ) -> Result<Model, AttendanceError> {
        let now = Utc::now();
        let today = start_of_day(now);

        let existing = Self::find_for_day(db, worker_id, today)
            .await?
            .ok_or(AttendanceError::NoPunchInFound)?;

        let Some(punch_in_time) = existing.punch_in_time else {
            return Err(AttendanceError::NoPunchInFound);
        };

        if existing.punch_out_time.is_some() {
            return Err(AttendanceError::AlreadyPunchedOut(existing));
        }

        let total_hours = elapsed_hours(punch_in_time, now);

        let mut active = existing.into_active_model();
        active.punch_out_time = Set(Some(now));
        active.punch_out_latitude = Set(Some(latitude));
        active.punch_out_longitude = Set(Some(longitude));
        active.punch_out_selfie_url = Set(Some(selfie_url.to_owned()));
        active.total_hours = Set(Some(total_hours));
        active.updated_at = Set(now);

        Ok(active.update(db).await?)
    }

    /// Today's punch state. Never fails on absence.
    pub async fn today_status(db: &DbConn, worker_id: i64) -> Result<TodayStatus, DbErr> {
        let today = start_of_day(Utc::now());

        Ok(match Self::find_for_day(db, worker_id, today).await? {
            None => TodayStatus::default(),
            Some(record) => TodayStatus {
                has_punched_in: record.punch_in_time.is_some(),
                has_punched_out: record.punch_out_time.is_some(),
                punch_in_time: record.punch_in_time,
                punch_out_time: record.punch_out_time,
            },
        })
    }

    /// A worker's own history over an inclusive date range, newest first.
    /// Both bounds are expanded to their full day before comparison.
    pub async fn records_in_range(
        db: &DbConn,
        worker_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Model>, AttendanceError> {
        if start_of_day(start) > start_of_day(end) {
            return Err(AttendanceError::InvalidDateRange);
        }

        Ok(Entity::find()
            .filter(Column::WorkerId.eq(worker_id))
            .filter(Column::Date.gte(start_of_day(start)))
            .filter(Column::Date.lte(end_of_day(end)))
            .order_by_desc(Column::Date)
            .all(db)
            .await?)
    }

    /// Cross-worker history for a site, enriched with worker and site names.
    pub async fn filtered(
        db: &DbConn,
        site_id: i64,
        selector: WorkerSelector,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        requesting_user_id: i64,
    ) -> Result<Vec<FilteredRecord>, AttendanceError> {
        if start_of_day(start) > start_of_day(end) {
            return Err(AttendanceError::InvalidDateRange);
        }

        let worker_ids: Vec<i64> = match selector {
            WorkerSelector::All => {
                site_user_assignment::Model::user_ids_for_site(db, site_id).await?
            }
            WorkerSelector::Myself => vec![requesting_user_id],
            WorkerSelector::One(id) => vec![id],
            WorkerSelector::Many(ids) => ids,
        };

        if worker_ids.is_empty() {
            return Ok(vec![]);
        }

        let records = Entity::find()
            .filter(Column::SiteId.eq(site_id))
            .filter(Column::WorkerId.is_in(worker_ids.clone()))
            .filter(Column::Date.gte(start_of_day(start)))
            .filter(Column::Date.lte(end_of_day(end)))
            .order_by_desc(Column::Date)
            .all(db)
            .await?;

        let workers: HashMap<i64, user::Model> = user::Entity::find()
            .filter(user::Column::Id.is_in(worker_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();

        let site = site::Entity::find_by_id(site_id).one(db).await?;

        Ok(records
            .into_iter()
            .map(|r| {
                let worker = workers.get(&r.worker_id);
                FilteredRecord {
                    id: r.id,
                    worker_id: r.worker_id,
                    worker_name: worker.and_then(|w| w.full_name.clone()),
                    worker_role: worker.map(|w| w.role),
                    site_id: r.site_id,
                    site_name: site.as_ref().map(|s| s.name.clone()),
                    site_code: site.as_ref().and_then(|s| s.code.clone()),
                    date: r.date,
                    punch_in_time: r.punch_in_time,
                    punch_in_latitude: r.punch_in_latitude,
                    punch_in_longitude: r.punch_in_longitude,
                    punch_in_selfie_url: r.punch_in_selfie_url,
                    punch_out_time: r.punch_out_time,
                    punch_out_latitude: r.punch_out_latitude,
                    punch_out_longitude: r.punch_out_longitude,
                    punch_out_selfie_url: r.punch_out_selfie_url,
                    total_hours: r.total_hours,
                    created_at: r.created_at,
                    updated_at: r.updated_at,
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::site_user_assignment::{AssignedRole, Model as AssignmentModel};
    use crate::models::user::{Model as UserModel, Role};
    use crate::test_utils::setup_test_db;
    use chrono::{Duration, TimeZone};
    use sea_orm::PaginatorTrait;

    async fn seed_worker(db: &DbConn, mobile: &str, name: &str) -> UserModel {
        UserModel::create(db, "+27", mobile, "pw", Some(name), Role::Worker, None)
            .await
            .unwrap()
    }

    async fn seed_site(db: &DbConn) -> site::Model {
        site::Model::create(db, Some("SITE-A"), "Alpha Yard", None, None, None)
            .await
            .unwrap()
    }

    /// Inserts a bare row for a specific day, bypassing the punch-in path.
    async fn seed_day_row(db: &DbConn, worker_id: i64, day: DateTime<Utc>) -> Model {
        let now = Utc::now();
        ActiveModel {
            worker_id: Set(worker_id),
            date: Set(start_of_day(day)),
            punch_in_time: Set(Some(day)),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn second_punch_in_same_day_is_rejected_without_a_new_row() {
        let db = setup_test_db().await;
        let worker = seed_worker(&db, "0820000001", "Thabo").await;

        let first = Model::punch_in(&db, worker.id, None, -25.75, 28.23, "/uploads/a.jpg")
            .await
            .unwrap();
        assert!(first.punch_in_time.is_some());

        let err = Model::punch_in(&db, worker.id, None, -25.75, 28.23, "/uploads/b.jpg")
            .await
            .unwrap_err();
        match err {
            AttendanceError::AlreadyPunchedIn(existing) => assert_eq!(existing.id, first.id),
            other => panic!("unexpected: {other:?}"),
        }

        let count = Entity::find().count(&db).await.unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn punch_in_against_unknown_site_is_rejected() {
        let db = setup_test_db().await;
        let worker = seed_worker(&db, "0820000001", "Thabo").await;

        let err = Model::punch_in(&db, worker.id, Some(999), -25.75, 28.23, "/uploads/a.jpg")
            .await
            .unwrap_err();
        assert!(matches!(err, AttendanceError::SiteNotFound));
        assert_eq!(Entity::find().count(&db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn punch_in_fills_an_empty_existing_row() {
        let db = setup_test_db().await;
        let worker = seed_worker(&db, "0820000001", "Thabo").await;

        let now = Utc::now();
        let bare = ActiveModel {
            worker_id: Set(worker.id),
            date: Set(start_of_day(now)),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&db)
        .await
        .unwrap();

        let filled = Model::punch_in(&db, worker.id, None, -25.75, 28.23, "/uploads/a.jpg")
            .await
            .unwrap();
        assert_eq!(filled.id, bare.id);
        assert!(filled.punch_in_time.is_some());
        assert_eq!(Entity::find().count(&db).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn punch_out_without_punch_in_is_rejected() {
        let db = setup_test_db().await;
        let worker = seed_worker(&db, "0820000001", "Thabo").await;

        let err = Model::punch_out(&db, worker.id, -25.75, 28.23, "/uploads/out.jpg")
            .await
            .unwrap_err();
        assert!(matches!(err, AttendanceError::NoPunchInFound));

        // A row whose punch_in_time is still null is treated the same way.
        let now = Utc::now();
        ActiveModel {
            worker_id: Set(worker.id),
            date: Set(start_of_day(now)),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&db)
        .await
        .unwrap();

        let err = Model::punch_out(&db, worker.id, -25.75, 28.23, "/uploads/out.jpg")
            .await
            .unwrap_err();
        assert!(matches!(err, AttendanceError::NoPunchInFound));
    }

    #[tokio::test]
    async fn double_punch_out_is_rejected() {
        let db = setup_test_db().await;
        let worker = seed_worker(&db, "0820000001", "Thabo").await;

        Model::punch_in(&db, worker.id, None, -25.75, 28.23, "/uploads/in.jpg")
            .await
            .unwrap();
        Model::punch_out(&db, worker.id, -25.75, 28.23, "/uploads/out.jpg")
            .await
            .unwrap();

        let err = Model::punch_out(&db, worker.id, -25.75, 28.23, "/uploads/out2.jpg")
            .await
            .unwrap_err();
        assert!(matches!(err, AttendanceError::AlreadyPunchedOut(_)));
    }

    #[tokio::test]
    async fn punch_out_freezes_rounded_total_hours() {
        let db = setup_test_db().await;
        let worker = seed_worker(&db, "0820000001", "Thabo").await;

        let record = Model::punch_in(&db, worker.id, None, -25.75, 28.23, "/uploads/in.jpg")
            .await
            .unwrap();

        // Backdate the punch-in by 8h30m so the shift has a known length.
        let mut active = record.into_active_model();
        active.punch_in_time = Set(Some(Utc::now() - Duration::minutes(8 * 60 + 30)));
        active.update(&db).await.unwrap();

        let done = Model::punch_out(&db, worker.id, -25.76, 28.24, "/uploads/out.jpg")
            .await
            .unwrap();

        assert_eq!(done.total_hours, Some(8.50));
        assert_eq!(
            done.total_hours,
            Some(elapsed_hours(done.punch_in_time.unwrap(), done.punch_out_time.unwrap()))
        );
    }

    #[tokio::test]
    async fn today_status_defaults_to_all_false() {
        let db = setup_test_db().await;
        let worker = seed_worker(&db, "0820000001", "Thabo").await;

        let status = Model::today_status(&db, worker.id).await.unwrap();
        assert!(!status.has_punched_in);
        assert!(!status.has_punched_out);
        assert!(status.punch_in_time.is_none());
        assert!(status.punch_out_time.is_none());

        Model::punch_in(&db, worker.id, None, -25.75, 28.23, "/uploads/in.jpg")
            .await
            .unwrap();
        let status = Model::today_status(&db, worker.id).await.unwrap();
        assert!(status.has_punched_in);
        assert!(!status.has_punched_out);
    }

    #[tokio::test]
    async fn range_query_is_inclusive_on_both_ends_and_newest_first() {
        let db = setup_test_db().await;
        let worker = seed_worker(&db, "0820000001", "Thabo").await;

        let day = |d: u32| Utc.with_ymd_and_hms(2026, 1, d, 9, 0, 0).unwrap();
        for d in [9, 10, 11, 12, 13] {
            seed_day_row(&db, worker.id, day(d)).await;
        }

        let records = Model::records_in_range(&db, worker.id, day(10), day(12))
            .await
            .unwrap();

        let days: Vec<u32> = records
            .iter()
            .map(|r| chrono::Datelike::day(&r.date))
            .collect();
        assert_eq!(days, vec![12, 11, 10]);
    }

    #[tokio::test]
    async fn inverted_range_is_rejected_before_querying() {
        let db = setup_test_db().await;
        let worker = seed_worker(&db, "0820000001", "Thabo").await;

        let start = Utc.with_ymd_and_hms(2026, 1, 12, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2026, 1, 10, 0, 0, 0).unwrap();
        let err = Model::records_in_range(&db, worker.id, start, end)
            .await
            .unwrap_err();
        assert!(matches!(err, AttendanceError::InvalidDateRange));
    }

    #[tokio::test]
    async fn filtered_query_expands_all_and_enriches_names() {
        let db = setup_test_db().await;
        let site = seed_site(&db).await;
        let thabo = seed_worker(&db, "0820000001", "Thabo").await;
        let lerato = seed_worker(&db, "0820000002", "Lerato").await;
        let outsider = seed_worker(&db, "0820000003", "Outsider").await;

        AssignmentModel::assign(&db, site.id, thabo.id, AssignedRole::Worker)
            .await
            .unwrap();
        AssignmentModel::assign(&db, site.id, lerato.id, AssignedRole::Worker)
            .await
            .unwrap();

        for worker in [&thabo, &lerato] {
            Model::punch_in(&db, worker.id, Some(site.id), -25.75, 28.23, "/uploads/x.jpg")
                .await
                .unwrap();
        }
        // On-site record for a worker not assigned to the queried site.
        Model::punch_in(&db, outsider.id, None, -25.75, 28.23, "/uploads/y.jpg")
            .await
            .unwrap();

        let now = Utc::now();
        let rows = Model::filtered(&db, site.id, WorkerSelector::All, now, now, thabo.id)
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.site_name.as_deref() == Some("Alpha Yard")));
        assert!(rows.iter().all(|r| r.site_code.as_deref() == Some("SITE-A")));
        assert!(rows.iter().any(|r| r.worker_name.as_deref() == Some("Thabo")));

        let rows = Model::filtered(&db, site.id, WorkerSelector::Myself, now, now, thabo.id)
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].worker_id, thabo.id);

        let rows = Model::filtered(
            &db,
            site.id,
            WorkerSelector::Many(vec![lerato.id]),
            now,
            now,
            thabo.id,
        )
        .await
        .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].worker_name.as_deref(), Some("Lerato"));
    }
}
