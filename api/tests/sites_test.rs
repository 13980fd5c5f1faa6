mod helpers;

use api::auth::generate_jwt;
use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
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

fn json_request(method: &str, uri: &str, token: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("Authorization", format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_request(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header("Authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

async fn seed_users(state: &util::state::AppState) -> (String, String, i64) {
    let db = state.db();
    let admin = UserModel::create(db, "+27", "0821110000", "pw", Some("Admin"), Role::Admin, None)
        .await
        .unwrap();
    let worker = UserModel::create(db, "+27", "0821110001", "pw", Some("Worker"), Role::Worker, None)
        .await
        .unwrap();
    (
        generate_jwt(admin.id, admin.role).0,
        generate_jwt(worker.id, worker.role).0,
        worker.id,
    )
}

#[tokio::test]
#[serial]
async fn site_creation_is_admin_only_with_unique_codes() {
    let (app, state) = make_test_app().await;
    let (admin_token, worker_token, _) = seed_users(&state).await;

    let body = json!({ "code": "S1", "name": "Yard", "address": "1 Main Rd" });

    let response = app
        .clone()
        .oneshot(json_request("POST", "/api/sites", &worker_token, body.clone()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .clone()
        .oneshot(json_request("POST", "/api/sites", &admin_token, body.clone()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["code"], "S1");

    let response = app
        .clone()
        .oneshot(json_request("POST", "/api/sites", &admin_token, body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
#[serial]
async fn assignment_lifecycle_end_to_end() {
    let (app, state) = make_test_app().await;
    let (admin_token, worker_token, worker_id) = seed_users(&state).await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/sites",
            &admin_token,
            json!({ "code": "S1", "name": "Yard" }),
        ))
        .await
        .unwrap();
    let json = body_json(response).await;
    let site_id = json["data"]["id"].as_i64().unwrap();

    // Worker starts out unassigned.
    let response = app
        .clone()
        .oneshot(get_request("/api/users/unassigned", &admin_token))
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);

    let assign_body = json!({ "user_id": worker_id });
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/api/sites/{site_id}/assign-worker"),
            &admin_token,
            assign_body.clone(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    // The same pair cannot be assigned twice, whatever the role.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/api/sites/{site_id}/assign-coordinator"),
            &admin_token,
            assign_body.clone(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Unknown ids are 404s.
    let response = app
        .clone()
        .oneshot(json_request("POST", "/api/sites/999/assign-worker", &admin_token, assign_body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // The worker now sees the site, and their assignment lookup resolves.
    let response = app
        .clone()
        .oneshot(get_request("/api/sites/my", &worker_token))
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);

    let response = app
        .clone()
        .oneshot(get_request("/api/users/my-site-assignment", &worker_token))
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json["data"]["site_id"], site_id);
    assert_eq!(json["data"]["assigned_role"], "worker");

    let response = app
        .clone()
        .oneshot(get_request(&format!("/api/sites/{site_id}/workers"), &admin_token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);
    assert_eq!(json["data"][0]["assigned_role"], "worker");

    // Unassign, then the lookup goes empty and a repeat delete is a 404.
    let delete = |site_id: i64, user_id: i64| {
        Request::builder()
            .method("DELETE")
            .uri(format!("/api/sites/{site_id}/workers/{user_id}"))
            .header("Authorization", format!("Bearer {admin_token}"))
            .body(Body::empty())
            .unwrap()
    };
    let response = app.clone().oneshot(delete(site_id, worker_id)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let response = app.clone().oneshot(delete(site_id, worker_id)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .clone()
        .oneshot(get_request("/api/users/my-site-assignment", &worker_token))
        .await
        .unwrap();
    let json = body_json(response).await;
    assert!(json["data"]["site_id"].is_null());
}

#[tokio::test]
#[serial]
async fn staffing_lookups_are_admin_only() {
    let (app, state) = make_test_app().await;
    let (admin_token, worker_token, _) = seed_users(&state).await;
    let db = state.db();

    UserModel::create(db, "+27", "0821110002", "pw", Some("C"), Role::SiteCoordinator, None)
        .await
        .unwrap();

    for uri in ["/api/sites/all", "/api/sites/without-coordinator", "/api/users/unassigned"] {
        let response = app.clone().oneshot(get_request(uri, &worker_token)).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN, "{uri}");
    }

    let response = app
        .clone()
        .oneshot(get_request("/api/users/site-coordinators", &admin_token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let coordinators = json["data"].as_array().unwrap();
    assert_eq!(coordinators.len(), 1);
    assert_eq!(coordinators[0]["full_name"], "C");
    // Password hashes never serialize.
    assert!(coordinators[0].get("password_hash").is_none());
}

#[tokio::test]
#[serial]
async fn sites_without_coordinator_reflects_assignments() {
    let (app, state) = make_test_app().await;
    let (admin_token, _, _) = seed_users(&state).await;
    let db = state.db();

    let coordinator =
        UserModel::create(db, "+27", "0821110002", "pw", Some("C"), Role::SiteCoordinator, None)
            .await
            .unwrap();

    for code in ["S1", "S2"] {
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/sites",
                &admin_token,
                json!({ "code": code, "name": code }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = app
        .clone()
        .oneshot(get_request("/api/sites/all", &admin_token))
        .await
        .unwrap();
    let json = body_json(response).await;
    let sites = json["data"].as_array().unwrap();
    assert_eq!(sites.len(), 2);
    let s1_id = sites[0]["id"].as_i64().unwrap();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/api/sites/{s1_id}/assign-coordinator"),
            &admin_token,
            json!({ "user_id": coordinator.id }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(get_request("/api/sites/without-coordinator", &admin_token))
        .await
        .unwrap();
    let json = body_json(response).await;
    let uncovered = json["data"].as_array().unwrap();
    assert_eq!(uncovered.len(), 1);
    assert_eq!(uncovered[0]["code"], "S2");
}
