//! Server API tests

use super::*;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use harcama_core::db::Database;
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::ServiceExt;

const BOUNDARY: &str = "harcama-test-boundary";

fn setup_test_app() -> Router {
    let db = Database::in_memory().unwrap();
    setup_app_with_db(db)
}

fn setup_app_with_db(db: Database) -> Router {
    let import_config = ImportConfig::embedded().unwrap();
    let config = ServerConfig {
        allowed_origins: vec![],
    };
    create_router(db, &import_config, config).unwrap()
}

async fn get_body_json(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body();
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn multipart_request(uri: &str, filename: &str, content: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n",
            filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn create(app: &Router, body: serde_json::Value) -> serde_json::Value {
    let response = app
        .clone()
        .oneshot(json_request("POST", "/api/expenses", body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    get_body_json(response).await
}

// ========== General ==========

#[tokio::test]
async fn test_api_root() {
    let app = setup_test_app();

    let response = app.oneshot(get("/api")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["message"], "Expense Tracker API");
}

#[tokio::test]
async fn test_security_headers() {
    let app = setup_test_app();

    let response = app.oneshot(get("/api/categories")).await.unwrap();
    let headers = response.headers();
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert_eq!(headers["x-frame-options"], "DENY");
}

#[tokio::test]
async fn test_list_categories() {
    let app = setup_test_app();

    let response = app.oneshot(get("/api/categories")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    let categories = json.as_array().unwrap();
    assert_eq!(categories.len(), 8);
    assert!(categories.iter().any(|c| c["id"] == "food"));
    assert!(categories.iter().all(|c| c["name"].is_string()));
}

// ========== Expense API Tests ==========

#[tokio::test]
async fn test_create_and_get_expense() {
    let app = setup_test_app();

    let created = create(
        &app,
        serde_json::json!({
            "title": "Migros",
            "amount": 125.5,
            "category": "food",
            "date": "2024-01-15"
        }),
    )
    .await;
    assert_eq!(created["amount"], 125.5);
    assert_eq!(created["category"], "food");

    let id = created["id"].as_str().unwrap();
    let response = app
        .oneshot(get(&format!("/api/expenses/{}", id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["title"], "Migros");
    assert_eq!(json["date"], "2024-01-15");
}

#[tokio::test]
async fn test_create_expense_rejects_invalid_input() {
    let app = setup_test_app();

    let cases = [
        serde_json::json!({ "title": "Migros", "amount": 10.0, "category": "groceries" }),
        serde_json::json!({ "title": "Migros", "amount": -5.0, "category": "food" }),
        serde_json::json!({ "title": "   ", "amount": 10.0, "category": "food" }),
        serde_json::json!({ "title": "Migros", "category": "food" }),
    ];

    for body in cases {
        let response = app
            .clone()
            .oneshot(json_request("POST", "/api/expenses", body.clone()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {}", body);
        let json = get_body_json(response).await;
        assert!(json["error"].is_string());
    }
}

#[tokio::test]
async fn test_create_expense_malformed_json() {
    let app = setup_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/expenses")
                .header("content-type", "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_expense_is_not_found() {
    let app = setup_test_app();

    let response = app
        .clone()
        .oneshot(get("/api/expenses/does-not-exist"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/api/expenses/does-not-exist")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .oneshot(json_request(
            "PUT",
            "/api/expenses/does-not-exist",
            serde_json::json!({ "title": "x" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_expenses_with_filters() {
    let app = setup_test_app();

    create(
        &app,
        serde_json::json!({ "title": "Migros", "amount": 100.0, "category": "food", "date": "2024-01-10" }),
    )
    .await;
    create(
        &app,
        serde_json::json!({ "title": "Uber", "amount": 50.0, "category": "transport", "date": "2024-02-10" }),
    )
    .await;
    create(
        &app,
        serde_json::json!({ "title": "BIM", "amount": 30.0, "category": "food", "date": "2024-03-10" }),
    )
    .await;

    let response = app.clone().oneshot(get("/api/expenses")).await.unwrap();
    let json = get_body_json(response).await;
    let all = json.as_array().unwrap();
    assert_eq!(all.len(), 3);
    // Newest first
    assert_eq!(all[0]["title"], "BIM");

    let response = app
        .clone()
        .oneshot(get("/api/expenses?category=food"))
        .await
        .unwrap();
    let json = get_body_json(response).await;
    assert_eq!(json.as_array().unwrap().len(), 2);

    let response = app
        .clone()
        .oneshot(get("/api/expenses?from=2024-02-01&to=2024-03-31"))
        .await
        .unwrap();
    let json = get_body_json(response).await;
    assert_eq!(json.as_array().unwrap().len(), 2);

    let response = app
        .clone()
        .oneshot(get("/api/expenses?limit=1&offset=1"))
        .await
        .unwrap();
    let json = get_body_json(response).await;
    let page = json.as_array().unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0]["title"], "Uber");

    let response = app
        .clone()
        .oneshot(get("/api/expenses?category=groceries"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(get("/api/expenses?from=15.01.2024"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_update_and_delete_expense() {
    let app = setup_test_app();

    let created = create(
        &app,
        serde_json::json!({ "title": "Migros", "amount": 100.0, "category": "food" }),
    )
    .await;
    let id = created["id"].as_str().unwrap().to_string();
    let uri = format!("/api/expenses/{}", id);

    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &uri,
            serde_json::json!({ "amount": 150.25, "description": "haftalık alışveriş" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["amount"], 150.25);
    assert_eq!(json["title"], "Migros");
    assert_eq!(json["description"], "haftalık alışveriş");

    let response = app
        .clone()
        .oneshot(json_request("PUT", &uri, serde_json::json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(&uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["message"], "Expense deleted successfully");

    let response = app.oneshot(get(&uri)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_expense_category() {
    let app = setup_test_app();

    let created = create(
        &app,
        serde_json::json!({ "title": "Trendyol", "amount": 300.0, "category": "other" }),
    )
    .await;
    let uri = format!("/api/expenses/{}/category", created["id"].as_str().unwrap());

    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &uri,
            serde_json::json!({ "category": "shopping" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["category"], "shopping");

    let response = app
        .oneshot(json_request(
            "PUT",
            &uri,
            serde_json::json!({ "category": "luxury" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ========== Statistics API Tests ==========

#[tokio::test]
async fn test_stats_summary() {
    let app = setup_test_app();

    create(
        &app,
        serde_json::json!({ "title": "Migros", "amount": 100.0, "category": "food" }),
    )
    .await;
    create(
        &app,
        serde_json::json!({ "title": "BIM", "amount": 50.5, "category": "food" }),
    )
    .await;

    let response = app
        .oneshot(get("/api/expenses/stats/summary"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["total_amount"], 150.5);
    assert_eq!(json["expense_count"], 2);
    assert_eq!(json["category_stats"]["food"]["count"], 2);
}

#[tokio::test]
async fn test_stats_monthly_window() {
    let app = setup_test_app();

    create(
        &app,
        serde_json::json!({ "title": "Migros", "amount": 100.0, "category": "food" }),
    )
    .await;

    let response = app
        .clone()
        .oneshot(get("/api/expenses/stats/monthly?months=3"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    let months = json.as_array().unwrap();
    assert_eq!(months.len(), 3);
    // The expense is dated today, so it lands in the last month
    assert_eq!(months[2]["total"], 100.0);
    assert_eq!(months[0]["total"], 0.0);

    let response = app
        .oneshot(get("/api/expenses/stats/monthly?months=0"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_stats_trends_and_predictions() {
    let app = setup_test_app();

    create(
        &app,
        serde_json::json!({ "title": "Uber", "amount": 80.0, "category": "transport" }),
    )
    .await;

    let response = app
        .clone()
        .oneshot(get("/api/expenses/stats/trends?months=2"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["months"].as_array().unwrap().len(), 2);
    let categories = json["categories"].as_array().unwrap();
    assert_eq!(categories.len(), 1);
    assert_eq!(categories[0]["category"], "transport");

    let response = app
        .oneshot(get("/api/expenses/stats/predictions"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert!(json["month"].is_string());
    assert_eq!(json["current_month"]["spent"], 80.0);
}

// ========== Limit API Tests ==========

#[tokio::test]
async fn test_set_and_check_limits() {
    let app = setup_test_app();

    create(
        &app,
        serde_json::json!({ "title": "Migros", "amount": 90.0, "category": "food" }),
    )
    .await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/expenses/limits",
            serde_json::json!({ "category": "food", "amount": 100.0 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["category"], "food");
    assert_eq!(json["amount"], 100.0);

    let response = app
        .clone()
        .oneshot(get("/api/expenses/limits/check"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    let checks = json.as_array().unwrap();
    assert_eq!(checks.len(), 1);
    assert_eq!(checks[0]["spent"], 90.0);
    assert_eq!(checks[0]["remaining"], 10.0);
    assert_eq!(checks[0]["status"], "warning");
}

#[tokio::test]
async fn test_limit_validation() {
    let app = setup_test_app();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/expenses/limits",
            serde_json::json!({ "category": "food", "amount": 0.0 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/expenses/limits",
            serde_json::json!({ "category": "food", "amount": 100.0, "month": "2024-13" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(get("/api/expenses/limits/check?month=January"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ========== Upload API Tests ==========

const STATEMENT_CSV: &str = "\
title,amount,date
Migros market,125.50,2024-01-15
Broken row,not-a-number,2024-01-16
Netflix,99.99,2024-01-17
";

#[tokio::test]
async fn test_upload_csv() {
    let app = setup_test_app();

    let response = app
        .clone()
        .oneshot(multipart_request(
            "/api/upload/csv",
            "ekstre.csv",
            STATEMENT_CSV.as_bytes(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert!(json["message"].is_string());
    assert_eq!(json["imported"], 2);
    assert_eq!(json["total_rows"], 3);
    let errors = json["errors"].as_array().unwrap();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].as_str().unwrap().contains("Row 2"));
    assert_eq!(json["detected_columns"]["amount"]["header"], "amount");
    assert!(json["auto_categorization"]["food"].is_array());
    assert!(json.get("records").is_none());

    let response = app.oneshot(get("/api/expenses")).await.unwrap();
    let json = get_body_json(response).await;
    assert_eq!(json.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_upload_csv_twice_duplicates() {
    let app = setup_test_app();

    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(multipart_request(
                "/api/upload/csv",
                "ekstre.csv",
                STATEMENT_CSV.as_bytes(),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app.oneshot(get("/api/expenses")).await.unwrap();
    let json = get_body_json(response).await;
    assert_eq!(json.as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn test_upload_excel_workbook() {
    let app = setup_test_app();
    let bytes = include_bytes!("../../harcama-core/tests/fixtures/hareketler.xlsx");

    let response = app
        .clone()
        .oneshot(multipart_request("/api/upload/excel", "hareketler.xlsx", bytes))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["imported"], 4);
    assert_eq!(json["total_rows"], 4);
    assert!(json["errors"].as_array().unwrap().is_empty());
    assert_eq!(json["detected_columns"]["date"]["header"], "Tarih");

    let response = app.oneshot(get("/api/expenses")).await.unwrap();
    let json = get_body_json(response).await;
    let expenses = json.as_array().unwrap();
    assert_eq!(expenses.len(), 4);
    assert!(expenses
        .iter()
        .any(|e| e["title"] == "MIGROS ATASEHIR" && e["amount"] == 1544.14));
}

#[tokio::test]
async fn test_upload_pdf_statement() {
    let app = setup_test_app();
    let bytes = include_bytes!("../../harcama-core/tests/fixtures/ekstre.pdf");

    let response = app
        .clone()
        .oneshot(multipart_request("/api/upload/pdf", "ekstre.pdf", bytes))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["detected"], 3);
    assert_eq!(json["auto_added"], 3);
    assert_eq!(json["sample_extractions"].as_array().unwrap().len(), 3);

    let response = app.oneshot(get("/api/expenses")).await.unwrap();
    let json = get_body_json(response).await;
    assert_eq!(json.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_upload_all_rows_failing_is_still_ok() {
    let app = setup_test_app();
    let csv = "açıklama;tutar\nMAXIPUAN KAZANIMI;0,46\nBONUS;0,10\n";

    let response = app
        .oneshot(multipart_request("/api/upload/csv", "puan.csv", csv.as_bytes()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["imported"], 0);
    assert_eq!(json["errors"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_upload_rejects_wrong_extension() {
    let app = setup_test_app();

    let response = app
        .clone()
        .oneshot(multipart_request(
            "/api/upload/csv",
            "ekstre.xlsx",
            STATEMENT_CSV.as_bytes(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(multipart_request(
            "/api/upload/excel",
            "ekstre.csv",
            STATEMENT_CSV.as_bytes(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(multipart_request(
            "/api/upload/pdf",
            "ekstre.txt",
            b"15.01.2024 MIGROS 100,00",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upload_unmappable_columns() {
    let app = setup_test_app();

    let response = app
        .clone()
        .oneshot(multipart_request("/api/upload/csv", "tek.csv", b"only\nMigros\n"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app.oneshot(get("/api/expenses")).await.unwrap();
    let json = get_body_json(response).await;
    assert!(json.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_upload_corrupt_files() {
    let app = setup_test_app();

    let response = app
        .clone()
        .oneshot(multipart_request(
            "/api/upload/excel",
            "ekstre.xlsx",
            b"this is not a workbook",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(multipart_request(
            "/api/upload/pdf",
            "ekstre.pdf",
            b"this is not a pdf",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = get_body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("PDF"));
}

#[tokio::test]
async fn test_upload_missing_file_field() {
    let app = setup_test_app();

    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(b"Content-Disposition: form-data; name=\"note\"\r\n\r\nhello");
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/upload/csv")
                .header(
                    "content-type",
                    format!("multipart/form-data; boundary={}", BOUNDARY),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = get_body_json(response).await;
    assert_eq!(json["error"], "Missing file field");
}

#[tokio::test]
async fn test_upload_persists_to_file_database() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("harcama.db");
    let path = path.to_str().unwrap();

    let app = setup_app_with_db(Database::new_unencrypted(path).unwrap());
    let response = app
        .oneshot(multipart_request(
            "/api/upload/csv",
            "ekstre.csv",
            STATEMENT_CSV.as_bytes(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let reopened = Database::new_unencrypted(path).unwrap();
    let count = reopened
        .count_expenses(&harcama_core::ExpenseFilter::default())
        .unwrap();
    assert_eq!(count, 2);
}
