use chrono::{NaiveDate, TimeZone, Utc};
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::sync::Arc;
use stockboard_api::server::{build_router, AppState};
use stockboard_api::types::{ApiResponse, DashboardResponse, LoginResponse, UserResponse};
use stockboard_core::common::time::FakeClockProvider;
use stockboard_core::config::AppConfig;
use stockboard_core::market::entity::{PriceSample, QuoteSnapshot};
use stockboard_core::test_utils::MockMarketDataProvider;
use stockboard_metrics::service::MetricsService;
use stockboard_store::system::SqliteSystemStore;
use tokio::net::TcpListener;

fn sample(y: i32, m: u32, d: u32, close: f64) -> PriceSample {
    PriceSample::new(NaiveDate::from_ymd_opt(y, m, d).unwrap(), close)
}

// 帮助函数：在随机端口启动测试服务器
async fn spawn_test_server() -> (String, tempfile::TempDir) {
    let _ = rustls::crypto::ring::default_provider().install_default();
    let _ = tracing_subscriber::fmt().with_env_filter("debug").try_init();

    let tmp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let system_store = Arc::new(SqliteSystemStore::open(tmp_dir.path()).await.unwrap());

    let provider = MockMarketDataProvider::new();
    provider.insert(
        "ACME",
        vec![
            sample(2022, 12, 30, 100.0),
            sample(2023, 12, 29, 120.0),
            sample(2024, 12, 31, 150.0),
        ],
        QuoteSnapshot {
            name: Some("Acme Corp".to_string()),
            current_price: Some(180.0),
            trailing_pe: Some(31.2),
            forward_pe: Some(27.9),
            price_to_sales_ttm: Some(8.1),
        },
    );
    let clock = Arc::new(FakeClockProvider::new(
        Utc.with_ymd_and_hms(2025, 6, 2, 15, 0, 0).unwrap(),
    ));
    let metrics = Arc::new(MetricsService::new(Arc::new(provider), clock, 11));

    let state = AppState {
        metrics,
        system_store,
        app_config: Arc::new(AppConfig::default()),
    };

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let router = build_router(state);
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    (format!("http://127.0.0.1:{}", port), tmp_dir)
}

async fn signup_and_login(client: &reqwest::Client, base_url: &str, email: &str) -> String {
    let res = client
        .post(format!("{}/api/v1/auth/signup", base_url))
        .json(&json!({ "email": email, "password": "secret123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = client
        .post(format!("{}/api/v1/auth/login", base_url))
        .json(&json!({ "email": email, "password": "secret123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: ApiResponse<LoginResponse> = res.json().await.unwrap();
    body.data.unwrap().token
}

#[tokio::test]
async fn test_auth_workflow() {
    let (base_url, _tmp) = spawn_test_server().await;
    let client = reqwest::Client::new();

    // 密码过短
    let res = client
        .post(format!("{}/api/v1/auth/signup", base_url))
        .json(&json!({ "email": "bob@example.com", "password": "123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["success"], false);

    // 注册成功，邮箱转为小写
    let res = client
        .post(format!("{}/api/v1/auth/signup", base_url))
        .json(&json!({ "email": "Bob@Example.com", "password": "secret123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: ApiResponse<UserResponse> = res.json().await.unwrap();
    assert_eq!(body.data.unwrap().email, "bob@example.com");

    // 重复注册
    let res = client
        .post(format!("{}/api/v1/auth/signup", base_url))
        .json(&json!({ "email": "bob@example.com", "password": "another1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "Email already registered");

    // 密码错误
    let res = client
        .post(format!("{}/api/v1/auth/login", base_url))
        .json(&json!({ "email": "bob@example.com", "password": "wrongpass" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    // 大小写不敏感登录
    let res = client
        .post(format!("{}/api/v1/auth/login", base_url))
        .json(&json!({ "email": "BOB@example.com", "password": "secret123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: ApiResponse<LoginResponse> = res.json().await.unwrap();
    let login = body.data.unwrap();
    assert_eq!(login.expires_in, 7 * 86400);
    assert!(!login.token.is_empty());

    // 未携带或携带伪造 Token
    let res = client
        .get(format!("{}/api/v1/user/dashboards", base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client
        .get(format!("{}/api/v1/user/dashboards", base_url))
        .bearer_auth("not-a-jwt")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

/// # Summary
/// 缺失字段或无法解析的请求体统一返回 400 与错误信封。
#[tokio::test]
async fn test_malformed_bodies_use_error_envelope() {
    let (base_url, _tmp) = spawn_test_server().await;
    let client = reqwest::Client::new();

    let cases = [
        ("auth/signup", json!({ "password": "secret123" })),
        ("auth/signup", json!({ "email": "carol@example.com" })),
        ("auth/login", json!({ "email": "carol@example.com" })),
        ("auth/login", json!({ "password": "secret123" })),
    ];
    for (path, payload) in cases {
        let res = client
            .post(format!("{}/api/v1/{}", base_url, path))
            .json(&payload)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "{} {}", path, payload);
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Email and password are required");
    }

    // 语法错误的 JSON
    let res = client
        .post(format!("{}/api/v1/auth/signup", base_url))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert!(body["error"].is_string());

    // 缺少看板名称
    let token = signup_and_login(&client, &base_url, "carol@example.com").await;
    let res = client
        .post(format!("{}/api/v1/user/dashboards", base_url))
        .bearer_auth(&token)
        .json(&json!({ "tickers": ["AAPL"] }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Dashboard name is required");
}

#[tokio::test]
async fn test_dashboard_workflow() {
    let (base_url, _tmp) = spawn_test_server().await;
    let client = reqwest::Client::new();
    let token = signup_and_login(&client, &base_url, "alice@example.com").await;

    // 空名称
    let res = client
        .post(format!("{}/api/v1/user/dashboards", base_url))
        .bearer_auth(&token)
        .json(&json!({ "name": "   " }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // 创建看板，初始代码被规范化并去重
    let res = client
        .post(format!("{}/api/v1/user/dashboards", base_url))
        .bearer_auth(&token)
        .json(&json!({ "name": " Big Tech ", "tickers": ["acme", "ACME", "bad ticker!"] }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: ApiResponse<DashboardResponse> = res.json().await.unwrap();
    let dashboard = body.data.unwrap();
    assert_eq!(dashboard.name, "Big Tech");
    assert_eq!(dashboard.tickers, vec!["ACME".to_string()]);
    let id = dashboard.id.clone();

    // 追加代码
    let res = client
        .post(format!("{}/api/v1/user/dashboards/{}/tickers", base_url, id))
        .bearer_auth(&token)
        .json(&json!({ "tickers": "nope, acme msft" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: ApiResponse<DashboardResponse> = res.json().await.unwrap();
    assert_eq!(
        body.data.unwrap().tickers,
        vec!["ACME".to_string(), "NOPE".to_string(), "MSFT".to_string()]
    );

    // 移除代码 (大小写不敏感)
    let res = client
        .delete(format!("{}/api/v1/user/dashboards/{}/tickers/msft", base_url, id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: ApiResponse<DashboardResponse> = res.json().await.unwrap();
    assert_eq!(
        body.data.unwrap().tickers,
        vec!["ACME".to_string(), "NOPE".to_string()]
    );

    // 批量指标：顺序与看板一致，失败代码只影响自身
    let res = client
        .get(format!("{}/api/v1/user/dashboards/{}/metrics", base_url, id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    let items = body["data"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["ticker"], "ACME");
    assert_eq!(items[0]["name"], "Acme Corp");
    assert!((items[0]["ytdReturn"].as_f64().unwrap() - 20.0).abs() < 1e-9);
    assert_eq!(items[0]["peLTM"], 31.2);
    assert!(items[0].get("error").is_none());
    assert_eq!(items[1]["ticker"], "NOPE");
    assert_eq!(items[1]["error"], "Data not found");
    assert!(items[1]["currentPrice"].is_null());

    // 重命名 (PUT 仅覆盖给出的字段)
    let res = client
        .put(format!("{}/api/v1/user/dashboards/{}", base_url, id))
        .bearer_auth(&token)
        .json(&json!({ "name": "Renamed" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: ApiResponse<DashboardResponse> = res.json().await.unwrap();
    let renamed = body.data.unwrap();
    assert_eq!(renamed.name, "Renamed");
    assert_eq!(renamed.tickers.len(), 2);
    assert!(renamed.updated_at >= dashboard.updated_at);

    // PUT 到不存在的 ID 即新建
    let res = client
        .put(format!("{}/api/v1/user/dashboards/custom-id", base_url))
        .bearer_auth(&token)
        .json(&json!({ "tickers": ["aapl"] }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: ApiResponse<DashboardResponse> = res.json().await.unwrap();
    let created = body.data.unwrap();
    assert_eq!(created.id, "custom-id");
    assert_eq!(created.name, "Dashboard");
    assert_eq!(created.tickers, vec!["AAPL".to_string()]);

    // 列表：最近修改的在前
    let res = client
        .get(format!("{}/api/v1/user/dashboards", base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let body: ApiResponse<Vec<DashboardResponse>> = res.json().await.unwrap();
    let list = body.data.unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0].id, "custom-id");

    // 另一个用户看不到 alice 的看板
    let other = signup_and_login(&client, &base_url, "mallory@example.com").await;
    let res = client
        .get(format!("{}/api/v1/user/dashboards/{}", base_url, id))
        .bearer_auth(&other)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let res = client
        .get(format!("{}/api/v1/user/dashboards/{}/metrics", base_url, id))
        .bearer_auth(&other)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    // 删除
    let res = client
        .delete(format!("{}/api/v1/user/dashboards/{}", base_url, id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: ApiResponse<bool> = res.json().await.unwrap();
    assert_eq!(body.data, Some(true));

    let res = client
        .get(format!("{}/api/v1/user/dashboards/{}", base_url, id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_public_stock_endpoint() {
    let (base_url, _tmp) = spawn_test_server().await;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/api/v1/stock/acme", base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["ticker"], "ACME");
    assert!((body["data"]["return2024"].as_f64().unwrap() - 25.0).abs() < 1e-9);
    assert!(body["data"]["return2025"].is_null());

    // 抓取失败仍返回 200
    let res = client
        .get(format!("{}/api/v1/stock/zzzz", base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["data"]["error"], "Data not found");

    // 非法代码
    let res = client
        .get(format!("{}/api/v1/stock/bad%20ticker!", base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // OpenAPI 文档可访问
    let res = client
        .get(format!("{}/api-docs/openapi.json", base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}
