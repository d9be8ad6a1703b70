//! Server API tests

use super::*;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use chrono::{Duration, NaiveDate};
use http_body_util::BodyExt;
use innkeep_core::db::Database;
use innkeep_core::models::{BookingStatus, NewBooking, Platform};
use tempfile::TempDir;
use tower::ServiceExt;

const BOOKING_COM_CSV: &str = "\
Book number,Booked by,Guest name(s),Check-in,Check-out,Price,Commission amount,Status
1234567890,Tran B,Tran B,2025-03-10,2025-03-12,US$120.00,US$18.00,ok
1234567891,Le C,Le C,2025-03-11,2025-03-13,US$95.50,US$14.33,ok
1234567892,Pham D,Pham D,2025-03-12,2025-03-14,US$80.00,US$12.00,cancelled_by_guest";

const AGODA_CSV: &str = "\
Booking ID,Guest Name,Check-In,Check-Out,Reference Sell Rate,Commission,Status
987654321,Tran B,10/03/2025,12/03/2025,\"2,500,000\",\"425,000\",Confirmed
987654322,Nguyen A,11/03/2025,13/03/2025,\"1,800,000\",\"306,000\",Cancelled";

fn setup_test_app() -> Router {
    let db = Database::in_memory().unwrap();
    create_router(db, None, ServerConfig::default())
}

/// Router plus a handle on its database, for tests that seed rows directly
fn setup_test_app_with_db() -> (Router, Database) {
    let db = Database::in_memory().unwrap();
    let app = create_router(db.clone(), None, ServerConfig::default());
    (app, db)
}

async fn get_body_json(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body();
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn get_body_text(response: axum::response::Response) -> String {
    let body = response.into_body();
    let bytes = body.collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn seed_booking(db: &Database, booking_id: &str, guest: &str, checkin: Option<&str>) {
    let checkin_date: Option<NaiveDate> = checkin.map(|s| s.parse().unwrap());
    db.insert_booking(&NewBooking {
        booking_id: booking_id.to_string(),
        guest_name: guest.to_string(),
        checkin_date,
        checkout_date: checkin_date.map(|d| d + Duration::days(2)),
        room_amount: 100.0,
        commission: 15.0,
        collected_amount: 0.0,
        collector: None,
        booking_status: BookingStatus::Confirmed,
        booking_notes: None,
        platform: Some(Platform::BookingCom),
        import_hash: format!("hash-{}", booking_id),
        original_data: None,
    })
    .unwrap();
}

/// Build a multipart upload request the way a browser form submits one
fn multipart_request(csv: &str, platform: Option<&str>) -> Request<Body> {
    let boundary = "InnkeepTestBoundary";
    let mut body = format!(
        "--{}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"bookings.csv\"\r\n\
         Content-Type: text/csv\r\n\r\n{}\r\n",
        boundary, csv
    );
    if let Some(platform) = platform {
        body.push_str(&format!(
            "--{}\r\nContent-Disposition: form-data; name=\"platform\"\r\n\r\n{}\r\n",
            boundary, platform
        ));
    }
    body.push_str(&format!("--{}--\r\n", boundary));

    Request::builder()
        .method("POST")
        .uri("/api/import")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(body))
        .unwrap()
}

// ========== Dashboard API Tests ==========

#[tokio::test]
async fn test_dashboard_empty() {
    let app = setup_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/dashboard")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["total_bookings"], 0);
    assert_eq!(json["confirmed_count"], 0);
    assert_eq!(json["total_room_amount"].as_f64().unwrap(), 0.0);
}

#[tokio::test]
async fn test_dashboard_reflects_seeded_bookings() {
    let (app, db) = setup_test_app_with_db();
    seed_booking(&db, "BK-1", "Tran B", Some("2025-03-10"));
    seed_booking(&db, "BK-2", "Le C", Some("2025-03-11"));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/dashboard")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["total_bookings"], 2);
    assert_eq!(json["confirmed_count"], 2);
    assert_eq!(json["total_room_amount"].as_f64().unwrap(), 200.0);
    assert_eq!(json["total_commission"].as_f64().unwrap(), 30.0);

    let platforms = json["platform_counts"].as_array().unwrap();
    assert_eq!(platforms.len(), 1);
    assert_eq!(platforms[0]["platform"], "booking_com");
    assert_eq!(platforms[0]["count"], 2);
}

// ========== Booking API Tests ==========

#[tokio::test]
async fn test_list_bookings_empty() {
    let app = setup_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/bookings")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert!(json["bookings"].as_array().unwrap().is_empty());
    assert_eq!(json["total_count"], 0);
}

#[tokio::test]
async fn test_list_bookings_returns_seeded() {
    let (app, db) = setup_test_app_with_db();
    seed_booking(&db, "BK-1", "Tran B", Some("2025-03-10"));
    seed_booking(&db, "BK-2", "Le C", Some("2025-03-11"));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/bookings")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    let bookings = json["bookings"].as_array().unwrap();
    assert_eq!(bookings.len(), 2);
    assert_eq!(json["total_count"], 2);
    assert_eq!(json["limit"], 50);
    assert_eq!(json["offset"], 0);

    // Newest check-in first
    assert_eq!(bookings[0]["booking_id"], "BK-2");
    assert_eq!(bookings[0]["guest_name"], "Le C");
    assert_eq!(bookings[0]["platform"], "booking_com");
}

#[tokio::test]
async fn test_list_bookings_guest_filter_is_substring() {
    let (app, db) = setup_test_app_with_db();
    seed_booking(&db, "BK-1", "Tran B", Some("2025-03-10"));
    seed_booking(&db, "BK-2", "Tran C", Some("2025-03-11"));
    seed_booking(&db, "BK-3", "Le C", Some("2025-03-12"));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/bookings?guest=tran")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["total_count"], 2);
    for booking in json["bookings"].as_array().unwrap() {
        assert!(booking["guest_name"].as_str().unwrap().contains("Tran"));
    }
}

#[tokio::test]
async fn test_list_bookings_status_filter() {
    let (app, db) = setup_test_app_with_db();
    seed_booking(&db, "BK-1", "Tran B", Some("2025-03-10"));

    // A manual entry without a status lands on pending
    let body = serde_json::json!({
        "guest_name": "Le C",
        "checkin_date": "2025-03-11"
    });
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/bookings")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/bookings?status=pending")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["total_count"], 1);
    assert_eq!(json["bookings"][0]["guest_name"], "Le C");
    assert_eq!(json["bookings"][0]["booking_status"], "pending");
}

#[tokio::test]
async fn test_list_bookings_invalid_status_rejected() {
    let app = setup_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/bookings?status=archived")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = get_body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("status"));
}

#[tokio::test]
async fn test_list_bookings_date_range_filter() {
    let (app, db) = setup_test_app_with_db();
    seed_booking(&db, "BK-1", "Tran B", Some("2025-03-05"));
    seed_booking(&db, "BK-2", "Le C", Some("2025-03-15"));
    seed_booking(&db, "BK-3", "Pham D", Some("2025-03-25"));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/bookings?from=2025-03-10&to=2025-03-20")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["total_count"], 1);
    assert_eq!(json["bookings"][0]["booking_id"], "BK-2");
}

#[tokio::test]
async fn test_list_bookings_pagination() {
    let (app, db) = setup_test_app_with_db();
    seed_booking(&db, "BK-1", "Tran B", Some("2025-03-10"));
    seed_booking(&db, "BK-2", "Le C", Some("2025-03-11"));
    seed_booking(&db, "BK-3", "Pham D", Some("2025-03-12"));

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/bookings?limit=2")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let json = get_body_json(response).await;
    assert_eq!(json["bookings"].as_array().unwrap().len(), 2);
    assert_eq!(json["total_count"], 3);
    assert_eq!(json["limit"], 2);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/bookings?limit=2&offset=2")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let json = get_body_json(response).await;
    assert_eq!(json["bookings"].as_array().unwrap().len(), 1);
    assert_eq!(json["offset"], 2);
}

#[tokio::test]
async fn test_list_bookings_limit_clamped() {
    let (app, db) = setup_test_app_with_db();
    seed_booking(&db, "BK-1", "Tran B", Some("2025-03-10"));
    seed_booking(&db, "BK-2", "Le C", Some("2025-03-11"));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/bookings?limit=0")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["limit"], 1);
    assert_eq!(json["bookings"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_create_booking() {
    let app = setup_test_app();

    let body = serde_json::json!({
        "booking_id": "BK-100",
        "guest_name": "Tran B",
        "checkin_date": "2025-03-10",
        "checkout_date": "2025-03-12",
        "room_amount": 120.0,
        "commission": 18.0,
        "status": "confirmed",
        "notes": "Late arrival"
    });

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/bookings")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["booking_id"], "BK-100");
    assert_eq!(json["guest_name"], "Tran B");
    assert_eq!(json["booking_status"], "confirmed");
    assert_eq!(json["room_amount"].as_f64().unwrap(), 120.0);
    assert_eq!(json["booking_notes"], "Late arrival");
    // Manual entries carry no platform
    assert!(json["platform"].is_null());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/bookings/BK-100")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_create_booking_derives_id_when_absent() {
    let app = setup_test_app();

    let body = serde_json::json!({
        "guest_name": "Le C",
        "checkin_date": "2025-03-11"
    });

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/bookings")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    let booking_id = json["booking_id"].as_str().unwrap();
    assert!(booking_id.starts_with("MAN-"));
    assert_eq!(json["booking_status"], "pending");
}

#[tokio::test]
async fn test_create_booking_empty_guest_rejected() {
    let app = setup_test_app();

    let body = serde_json::json!({
        "guest_name": "   "
    });

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/bookings")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = get_body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("Guest name"));
}

#[tokio::test]
async fn test_create_booking_duplicate_id_conflict() {
    let app = setup_test_app();

    let body = serde_json::json!({
        "booking_id": "BK-200",
        "guest_name": "Tran B"
    });

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/bookings")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/bookings")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_create_booking_invalid_json() {
    let app = setup_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/bookings")
                .header("content-type", "application/json")
                .body(Body::from("not json at all"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = get_body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("Invalid JSON"));
}

#[tokio::test]
async fn test_get_booking_not_found() {
    let app = setup_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/bookings/BK-999")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_booking_notes() {
    let (app, db) = setup_test_app_with_db();
    seed_booking(&db, "BK-1", "Tran B", Some("2025-03-10"));

    let body = serde_json::json!({ "notes": "Guest asked for a quiet room" });

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PATCH")
                .uri("/api/bookings/BK-1/notes")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["success"], true);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/bookings/BK-1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let json = get_body_json(response).await;
    assert_eq!(json["booking_notes"], "Guest asked for a quiet room");
}

#[tokio::test]
async fn test_update_notes_missing_booking() {
    let app = setup_test_app();

    let body = serde_json::json!({ "notes": "anything" });

    let response = app
        .oneshot(
            Request::builder()
                .method("PATCH")
                .uri("/api/bookings/BK-999/notes")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_booking_status() {
    let (app, db) = setup_test_app_with_db();
    seed_booking(&db, "BK-1", "Tran B", Some("2025-03-10"));

    let body = serde_json::json!({ "status": "pending" });

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PATCH")
                .uri("/api/bookings/BK-1/status")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/bookings/BK-1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let json = get_body_json(response).await;
    assert_eq!(json["booking_status"], "pending");
}

#[tokio::test]
async fn test_update_booking_status_invalid_value() {
    let (app, db) = setup_test_app_with_db();
    seed_booking(&db, "BK-1", "Tran B", Some("2025-03-10"));

    let body = serde_json::json!({ "status": "archived" });

    let response = app
        .oneshot(
            Request::builder()
                .method("PATCH")
                .uri("/api/bookings/BK-1/status")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_booking() {
    let (app, db) = setup_test_app_with_db();
    seed_booking(&db, "BK-1", "Tran B", Some("2025-03-10"));

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/api/bookings/BK-1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["success"], true);
    assert!(json.get("error").is_none());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/bookings/BK-1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_booking_missing_reports_failure() {
    let app = setup_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/api/bookings/BK-999")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let json = get_body_json(response).await;
    assert_eq!(json["success"], false);
    assert!(json["error"].as_str().unwrap().contains("BK-999"));
}

// ========== Duplicate API Tests ==========

#[tokio::test]
async fn test_detect_duplicates_empty() {
    let app = setup_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/duplicates")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["total_groups"], 0);
    assert!(json["duplicates"].as_array().unwrap().is_empty());
    assert_eq!(json["processing_info"]["processed_guests"], 0);
}

#[tokio::test]
async fn test_detect_duplicates_groups_by_guest_name() {
    let (app, db) = setup_test_app_with_db();
    // Four copies under one guest, spread over a 3-day check-in window,
    // plus an unrelated booking that must not join the group
    seed_booking(&db, "BK-1", "Tran B", Some("2025-03-10"));
    seed_booking(&db, "BK-2", "Tran B", Some("2025-03-13"));
    seed_booking(&db, "BK-3", "Le C", Some("2025-03-11"));
    seed_booking(&db, "BK-4", "Tran B", Some("2025-03-10"));
    seed_booking(&db, "BK-5", "Tran B", Some("2025-03-13"));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/duplicates")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["total_groups"], 1);
    assert_eq!(json["processing_info"]["processed_guests"], 2);

    let group = &json["duplicates"][0];
    assert_eq!(group["guest_name"], "Tran B");
    assert_eq!(group["bookings"].as_array().unwrap().len(), 4);
    assert_eq!(group["date_difference_days"], 3);
}

#[tokio::test]
async fn test_detect_duplicates_names_compared_exactly() {
    let (app, db) = setup_test_app_with_db();
    seed_booking(&db, "BK-1", "Tran B", Some("2025-03-10"));
    seed_booking(&db, "BK-2", "tran b", Some("2025-03-10"));
    seed_booking(&db, "BK-3", "Tran B ", Some("2025-03-10"));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/duplicates")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    // Case and whitespace variants are three different guests
    let json = get_body_json(response).await;
    assert_eq!(json["total_groups"], 0);
    assert_eq!(json["processing_info"]["processed_guests"], 3);
}

#[tokio::test]
async fn test_detect_duplicates_guest_filter() {
    let (app, db) = setup_test_app_with_db();
    seed_booking(&db, "BK-1", "Tran B", Some("2025-03-10"));
    seed_booking(&db, "BK-2", "Tran B", Some("2025-03-11"));
    seed_booking(&db, "BK-3", "Le C", Some("2025-03-12"));
    seed_booking(&db, "BK-4", "Le C", Some("2025-03-12"));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/duplicates?guest=Le%20C")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["total_groups"], 1);
    assert_eq!(json["duplicates"][0]["guest_name"], "Le C");
    assert_eq!(json["processing_info"]["processed_guests"], 1);
}

#[tokio::test]
async fn test_compare_duplicates_marks_divergent_fields() {
    let app = setup_test_app();

    // Two entries for the same guest that disagree on the room amount
    for (id, amount) in [("BK-1", 120.0), ("BK-2", 95.0)] {
        let body = serde_json::json!({
            "booking_id": id,
            "guest_name": "Tran B",
            "checkin_date": "2025-03-10",
            "room_amount": amount
        });
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/bookings")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/duplicates/comparison")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    let comparisons = json.as_array().unwrap();
    assert_eq!(comparisons.len(), 1);

    let comparison = &comparisons[0];
    assert_eq!(comparison["guest_name"], "Tran B");
    assert_eq!(comparison["booking_ids"].as_array().unwrap().len(), 2);

    let fields = comparison["fields"].as_array().unwrap();
    let room = fields
        .iter()
        .find(|f| f["field"] == "room_amount")
        .unwrap();
    assert_eq!(room["divergent"], true);
    let values = room["values"].as_array().unwrap();
    assert!(values.contains(&serde_json::json!("120")));
    assert!(values.contains(&serde_json::json!("95")));

    // Both entries agree on the check-in date
    let checkin = fields
        .iter()
        .find(|f| f["field"] == "checkin_date")
        .unwrap();
    assert_eq!(checkin["divergent"], false);
}

#[tokio::test]
async fn test_resolve_duplicates_deletes_selection() {
    let (app, db) = setup_test_app_with_db();
    seed_booking(&db, "BK-1", "Tran B", Some("2025-03-10"));
    seed_booking(&db, "BK-2", "Tran B", Some("2025-03-10"));
    seed_booking(&db, "BK-3", "Tran B", Some("2025-03-10"));

    let body = serde_json::json!({ "booking_ids": ["BK-2", "BK-3"] });

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/duplicates/resolve")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["success_count"], 2);
    assert_eq!(json["fail_count"], 0);
    assert!(json["failed"].as_array().unwrap().is_empty());

    // Only the kept copy is left, so nothing is duplicated anymore
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/duplicates")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let json = get_body_json(response).await;
    assert_eq!(json["total_groups"], 0);
    assert_eq!(db.count_bookings().unwrap(), 1);
    assert!(db.get_booking("BK-1").unwrap().is_some());
}

#[tokio::test]
async fn test_resolve_missing_id_continues_with_rest() {
    let (app, db) = setup_test_app_with_db();
    seed_booking(&db, "BK-1", "Tran B", Some("2025-03-10"));
    seed_booking(&db, "BK-2", "Tran B", Some("2025-03-10"));
    seed_booking(&db, "BK-3", "Tran B", Some("2025-03-10"));

    let body = serde_json::json!({ "booking_ids": ["BK-1", "BK-404", "BK-3"] });

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/duplicates/resolve")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["success_count"], 2);
    assert_eq!(json["fail_count"], 1);

    let failed = json["failed"].as_array().unwrap();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0]["booking_id"], "BK-404");
    assert!(failed[0]["error"].as_str().unwrap().contains("not found"));

    // The id after the failure was still deleted
    assert!(db.get_booking("BK-3").unwrap().is_none());
    assert!(db.get_booking("BK-2").unwrap().is_some());
}

#[tokio::test]
async fn test_resolve_empty_selection_is_noop() {
    let (app, db) = setup_test_app_with_db();
    seed_booking(&db, "BK-1", "Tran B", Some("2025-03-10"));

    let body = serde_json::json!({ "booking_ids": [] });

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/duplicates/resolve")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["success_count"], 0);
    assert_eq!(json["fail_count"], 0);
    assert_eq!(db.count_bookings().unwrap(), 1);
}

// ========== Import API Tests ==========

#[tokio::test]
async fn test_import_csv_detects_platform() {
    let app = setup_test_app();

    let response = app
        .oneshot(multipart_request(BOOKING_COM_CSV, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["imported"], 2);
    assert_eq!(json["duplicates"], 0);
    assert_eq!(json["skipped"], 1);
    assert!(json["session_id"].as_i64().unwrap() > 0);
}

#[tokio::test]
async fn test_import_same_file_twice_counts_duplicates() {
    let app = setup_test_app();

    let response = app
        .clone()
        .oneshot(multipart_request(BOOKING_COM_CSV, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(multipart_request(BOOKING_COM_CSV, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["imported"], 0);
    assert_eq!(json["duplicates"], 2);
    assert_eq!(json["skipped"], 1);
}

#[tokio::test]
async fn test_import_with_explicit_platform() {
    let (app, db) = setup_test_app_with_db();

    let response = app
        .oneshot(multipart_request(AGODA_CSV, Some("agoda")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["imported"], 1);
    assert_eq!(json["skipped"], 1);

    let booking = db.get_booking("987654321").unwrap().unwrap();
    assert_eq!(booking.platform, Some(Platform::Agoda));
}

#[tokio::test]
async fn test_import_unrecognized_format_rejected() {
    let app = setup_test_app();

    let csv = "Some,Random,Headers\n1,2,3";
    let response = app.oneshot(multipart_request(csv, None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = get_body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("Unrecognized"));
}

#[tokio::test]
async fn test_import_missing_file_rejected() {
    let app = setup_test_app();

    let boundary = "InnkeepTestBoundary";
    let body = format!(
        "--{}\r\nContent-Disposition: form-data; name=\"platform\"\r\n\r\nagoda\r\n--{}--\r\n",
        boundary, boundary
    );

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/import")
                .header(
                    "content-type",
                    format!("multipart/form-data; boundary={}", boundary),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = get_body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("file"));
}

#[tokio::test]
async fn test_import_history_records_sessions() {
    let app = setup_test_app();

    let response = app
        .clone()
        .oneshot(multipart_request(BOOKING_COM_CSV, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/import/history")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["total"], 1);

    let session = &json["sessions"][0];
    assert_eq!(session["filename"], "bookings.csv");
    assert_eq!(session["platform"], "booking_com");
    assert_eq!(session["status"], "completed");
    assert_eq!(session["imported_count"], 2);
    assert_eq!(session["duplicate_count"], 0);
    assert_eq!(session["skipped_count"], 1);
}

#[tokio::test]
async fn test_get_import_session() {
    let app = setup_test_app();

    let response = app
        .clone()
        .oneshot(multipart_request(BOOKING_COM_CSV, None))
        .await
        .unwrap();
    let session_id = get_body_json(response).await["session_id"]
        .as_i64()
        .unwrap();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/api/import/history/{}", session_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["id"].as_i64().unwrap(), session_id);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/import/history/9999")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ========== Calendar API Tests ==========

#[tokio::test]
async fn test_calendar_counts_occupancy() {
    let (app, db) = setup_test_app_with_db();
    // Check-in 2025-03-10, check-out 2025-03-12
    seed_booking(&db, "BK-1", "Tran B", Some("2025-03-10"));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/calendar?year=2025&month=3")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    let days = json.as_array().unwrap();
    assert_eq!(days.len(), 31);

    let by_date = |date: &str| {
        days.iter()
            .find(|d| d["date"] == date)
            .unwrap_or_else(|| panic!("day {} missing", date))
            .clone()
    };

    assert_eq!(by_date("2025-03-10")["arrivals"], 1);
    assert_eq!(by_date("2025-03-11")["staying"], 1);
    assert_eq!(by_date("2025-03-12")["departures"], 1);
    // Departure day is not a stay night
    assert_eq!(by_date("2025-03-12")["staying"], 0);
}

#[tokio::test]
async fn test_calendar_invalid_month_rejected() {
    let app = setup_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/calendar?year=2025&month=13")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ========== Audit API Tests ==========

#[tokio::test]
async fn test_audit_log_records_operator() {
    let (app, db) = setup_test_app_with_db();
    seed_booking(&db, "BK-1", "Tran B", Some("2025-03-10"));

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/api/bookings/BK-1")
                .header("x-operator", "reception")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/audit")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    let entries = json.as_array().unwrap();
    assert!(!entries.is_empty());

    // Most recent first
    assert_eq!(entries[0]["action"], "delete");
    assert_eq!(entries[0]["operator"], "reception");
    assert_eq!(entries[0]["entity_type"], "booking");
    assert_eq!(entries[0]["entity_id"], "BK-1");
}

#[tokio::test]
async fn test_audit_operator_defaults_to_local() {
    let app = setup_test_app();

    let body = serde_json::json!({ "guest_name": "Tran B" });
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/bookings")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/audit")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let json = get_body_json(response).await;
    let entries = json.as_array().unwrap();
    assert_eq!(entries[0]["action"], "create");
    assert_eq!(entries[0]["operator"], "local");
}

// ========== Export API Tests ==========

#[tokio::test]
async fn test_export_bookings_csv() {
    let (app, db) = setup_test_app_with_db();
    seed_booking(&db, "BK-1", "Tran B", Some("2025-03-10"));
    seed_booking(&db, "BK-2", "Le C", Some("2025-03-11"));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/export/bookings")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "text/csv; charset=utf-8"
    );
    assert!(response
        .headers()
        .get("content-disposition")
        .unwrap()
        .to_str()
        .unwrap()
        .contains("attachment"));

    let csv = get_body_text(response).await;
    let lines: Vec<&str> = csv.lines().collect();
    assert!(lines[0].starts_with("booking_id,guest_name,checkin_date"));
    assert_eq!(lines.len(), 3);
    assert!(csv.contains("BK-1"));
    assert!(csv.contains("Tran B"));
}

#[tokio::test]
async fn test_export_respects_filters() {
    let (app, db) = setup_test_app_with_db();
    seed_booking(&db, "BK-1", "Tran B", Some("2025-03-10"));
    seed_booking(&db, "BK-2", "Le C", Some("2025-03-11"));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/export/bookings?guest=Tran")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let csv = get_body_text(response).await;
    assert!(csv.contains("BK-1"));
    assert!(!csv.contains("BK-2"));
}

// ========== Security Tests ==========

#[tokio::test]
async fn test_security_headers_present() {
    let app = setup_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/dashboard")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let headers = response.headers();
    assert_eq!(headers.get("x-content-type-options").unwrap(), "nosniff");
    assert_eq!(headers.get("x-frame-options").unwrap(), "DENY");
    assert!(headers.get("content-security-policy").is_some());
}

#[tokio::test]
async fn test_unicode_guest_names_survive_round_trip() {
    let app = setup_test_app();

    let body = serde_json::json!({
        "booking_id": "BK-1",
        "guest_name": "Trần Bình"
    });

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/bookings")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/bookings/BK-1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let json = get_body_json(response).await;
    assert_eq!(json["guest_name"], "Trần Bình");
}

#[tokio::test]
async fn test_error_response_no_internal_details() {
    let app = setup_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/bookings/BK-999")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let json = get_body_json(response).await;
    let error_msg = json["error"].as_str().unwrap();

    assert!(!error_msg.contains("src/"));
    assert!(!error_msg.contains("panic"));
    assert!(!error_msg.contains("thread"));
}

// ========== Static File Tests ==========

#[tokio::test]
async fn test_static_files_served_when_dir_given() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(
        temp_dir.path().join("index.html"),
        "<html><body>innkeep frontend</body></html>",
    )
    .unwrap();

    let db = Database::in_memory().unwrap();
    let app = create_router(
        db,
        Some(temp_dir.path().to_str().unwrap()),
        ServerConfig::default(),
    );

    // "/" falls through to the static dir and serves index.html
    let response = app
        .clone()
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = get_body_text(response).await;
    assert!(body.contains("innkeep frontend"));

    // API routes still win over the fallback
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/dashboard")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_route_404_without_static_dir() {
    let app = setup_test_app();

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
