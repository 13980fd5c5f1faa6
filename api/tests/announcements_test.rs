mod helpers;

use api::auth::generate_jwt;
use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use db::models::site::Model as SiteModel;
use db::models::site_user_assignment::{AssignedRole, Model as AssignmentModel};
use db::models::user::{Model as UserModel, Role};
use helpers::make_test_app;
use serde_json::{Value, json};
use serial_test::serial;
use tower::ServiceExt;

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn post_announcement(token: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/announcements")
        .header("Authorization", format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

struct Fixture {
    worker_token: String,
    coordinator_token: String,
    admin_token: String,
    site_id: i64,
    other_site_id: i64,
}

async fn seed(state: &util::state::AppState) -> Fixture {
    let db = state.db();
    let worker = UserModel::create(db, "+27", "0821110001", "pw", Some("W"), Role::Worker, None)
        .await
        .unwrap();
    let coordinator =
        UserModel::create(db, "+27", "0821110002", "pw", Some("C"), Role::SiteCoordinator, None)
            .await
            .unwrap();
    let admin = UserModel::create(db, "+27", "0821110003", "pw", Some("A"), Role::Admin, None)
        .await
        .unwrap();
    let site = SiteModel::create(db, Some("S1"), "Yard", None, None, None)
        .await
        .unwrap();
    let other_site = SiteModel::create(db, Some("S2"), "Depot", None, None, None)
        .await
        .unwrap();
    AssignmentModel::assign(db, site.id, worker.id, AssignedRole::Worker)
        .await
        .unwrap();
    AssignmentModel::assign(db, site.id, coordinator.id, AssignedRole::SiteCoordinator)
        .await
        .unwrap();

    Fixture {
        worker_token: generate_jwt(worker.id, worker.role).0,
        coordinator_token: generate_jwt(coordinator.id, coordinator.role).0,
        admin_token: generate_jwt(admin.id, admin.role).0,
        site_id: site.id,
        other_site_id: other_site.id,
    }
}

#[tokio::test]
#[serial]
async fn posting_requires_coordinator_or_admin_standing() {
    let (app, state) = make_test_app().await;
    let fx = seed(&state).await;

    let body = json!({
        "title": "Gate closed",
        "message": "Use the south entrance",
        "priority": "high",
        "site_id": fx.site_id,
    });

    // Workers cannot post at all.
    let response = app
        .clone()
        .oneshot(post_announcement(&fx.worker_token, body.clone()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Coordinators may post to any site, assigned or not.
    let response = app
        .clone()
        .oneshot(post_announcement(&fx.coordinator_token, body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let elsewhere = json!({
        "title": "T", "message": "M", "priority": "low", "site_id": fx.other_site_id,
    });
    let response = app
        .clone()
        .oneshot(post_announcement(&fx.coordinator_token, elsewhere))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    // Global posts are open to coordinators too, not just admins.
    let global = json!({ "title": "T", "message": "M", "priority": "high" });
    let response = app
        .clone()
        .oneshot(post_announcement(&fx.coordinator_token, global.clone()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert!(json["data"]["site_id"].is_null());

    // And to admins, of course.
    let response = app
        .clone()
        .oneshot(post_announcement(&fx.admin_token, global))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
#[serial]
async fn unknown_priority_is_a_bad_request() {
    let (app, state) = make_test_app().await;
    let fx = seed(&state).await;

    let body = json!({
        "title": "T", "message": "M", "priority": "urgent", "site_id": fx.site_id,
    });
    let response = app
        .clone()
        .oneshot(post_announcement(&fx.coordinator_token, body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[serial]
async fn feed_is_scoped_and_priority_ordered() {
    let (app, state) = make_test_app().await;
    let fx = seed(&state).await;

    for (title, priority, site_id) in [
        ("low note", "low", Some(fx.site_id)),
        ("urgent gate", "high", Some(fx.site_id)),
        ("medium note", "medium", Some(fx.site_id)),
    ] {
        let response = app
            .clone()
            .oneshot(post_announcement(
                &fx.coordinator_token,
                json!({ "title": title, "message": "m", "priority": priority, "site_id": site_id }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }
    // A global post from the admin lands in every feed.
    let response = app
        .clone()
        .oneshot(post_announcement(
            &fx.admin_token,
            json!({ "title": "company wide", "message": "m", "priority": "high" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/announcements/my-sites")
                .header("Authorization", format!("Bearer {}", fx.worker_token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let titles: Vec<&str> = json["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["title"].as_str().unwrap())
        .collect();
    // Highs first, newest high leading, then medium, then low.
    assert_eq!(titles, vec!["company wide", "urgent gate", "medium note", "low note"]);
}

#[tokio::test]
#[serial]
async fn deactivation_is_author_only_and_one_way() {
    let (app, state) = make_test_app().await;
    let fx = seed(&state).await;

    let response = app
        .clone()
        .oneshot(post_announcement(
            &fx.coordinator_token,
            json!({ "title": "T", "message": "M", "priority": "low", "site_id": fx.site_id }),
        ))
        .await
        .unwrap();
    let json = body_json(response).await;
    let id = json["data"]["id"].as_i64().unwrap();

    let deactivate = |token: &str, id: i64| {
        Request::builder()
            .method("PATCH")
            .uri(format!("/api/announcements/{id}/deactivate"))
            .header("Authorization", format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap()
    };

    // Even an admin cannot deactivate someone else's post.
    let response = app.clone().oneshot(deactivate(&fx.admin_token, id)).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app.clone().oneshot(deactivate(&fx.coordinator_token, 9999)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app.clone().oneshot(deactivate(&fx.coordinator_token, id)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["is_active"], false);

    // Deactivated posts leave the worker feed.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/announcements/my-sites")
                .header("Authorization", format!("Bearer {}", fx.worker_token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let json = body_json(response).await;
    assert!(json["data"].as_array().unwrap().is_empty());

    // But stay visible, flagged, in the author's own list.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/announcements/my")
                .header("Authorization", format!("Bearer {}", fx.coordinator_token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let json = body_json(response).await;
    let mine = json["data"].as_array().unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0]["is_active"], false);
}
