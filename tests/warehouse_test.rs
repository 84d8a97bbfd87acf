//! End-to-end test against a real star-schema warehouse.
//!
//! Requires a running PostgreSQL instance. Set `TEST_DATABASE_URL` to a
//! connection string for a **dedicated test database** (the `dim_*` and
//! `fact_views` tables are dropped and recreated). Defaults to
//! `postgres://bi:bi@localhost:5432/bi_test`.
//!
//! Run with: `cargo test --test warehouse_test -- --ignored`

use std::collections::HashMap;
use std::sync::Arc;

use bi_dashboard::config::AppConfig;
use bi_dashboard::db::{self, PgWarehouse};
use bi_dashboard::{routes, AppState};
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use sqlx::PgPool;
use tokio::net::TcpListener;
use tokio::sync::Mutex;

/// Both tests rebuild the same tables.
static WAREHOUSE_LOCK: Mutex<()> = Mutex::const_new(());

fn database_url() -> String {
    std::env::var("TEST_DATABASE_URL")
        .unwrap_or_else(|_| "postgres://bi:bi@localhost:5432/bi_test".into())
}

/// Recreate the schema and load the given extra rows on top of the base set.
async fn load_fixture(pool: &PgPool, extra: &str) {
    sqlx::raw_sql(include_str!("fixtures/warehouse.sql"))
        .execute(pool)
        .await
        .expect("schema");

    sqlx::raw_sql(
        "INSERT INTO dim_movie (movie_id, title, genre) VALUES (1, 'Test Movie', 'Drama');
         INSERT INTO dim_date (date_id, date) VALUES (1, '2024-01-01'), (2, '2024-01-02');
         INSERT INTO fact_views (movie_id, date_id, total_views) VALUES (1, 1, 100), (1, 2, 50);",
    )
    .execute(pool)
    .await
    .expect("base rows");

    if !extra.is_empty() {
        sqlx::raw_sql(extra).execute(pool).await.expect("extra rows");
    }
}

/// Spin up the app on a random port against the test database.
async fn start_server() -> (String, tokio::task::JoinHandle<()>) {
    let url = database_url();
    let vars = HashMap::from([("DATABASE_URL", url.as_str())]);
    let config = AppConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string())).unwrap();

    let pool = db::create_pool(&config).unwrap();
    let app = routes::router(AppState::new(Arc::new(PgWarehouse::new(pool))), &config);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });

    (base_url, handle)
}

async fn get_json(client: &Client, url: String) -> Value {
    let resp = client.get(url).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    resp.json().await.unwrap()
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL pointing to a dedicated test database"]
async fn warehouse_round_trip() {
    let _guard = WAREHOUSE_LOCK.lock().await;
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(2)
        .connect(&database_url())
        .await
        .expect("pool");

    // 12 genres, 20 countries, 40 more viewed dates and a same-title movie
    // pair on top of the base rows, enough to exercise every row cap.
    let mut extra = String::new();
    for i in 0..12 {
        extra.push_str(&format!(
            "INSERT INTO dim_movie VALUES ({id}, 'Movie {id}', 'Genre {i:02}');\n",
            id = 100 + i
        ));
    }
    extra.push_str(
        "INSERT INTO dim_movie VALUES (200, 'Twin', 'Thriller'), (201, 'Twin', 'Thriller');\n",
    );
    for d in 0..40 {
        extra.push_str(&format!(
            "INSERT INTO dim_date VALUES ({id}, DATE '2024-02-01' + {d});\n",
            id = 10 + d
        ));
    }
    for i in 0..12 {
        extra.push_str(&format!(
            "INSERT INTO fact_views VALUES ({movie}, {date}, {views});\n",
            movie = 100 + i,
            date = 10 + i,
            views = (i + 1) * 10
        ));
    }
    extra.push_str("INSERT INTO fact_views VALUES (200, 30, 7), (201, 31, 7);\n");
    extra.push_str("INSERT INTO dim_movie VALUES (300, 'Filler', 'Documentary');\n");
    for d in 0..40 {
        extra.push_str(&format!("INSERT INTO fact_views VALUES (300, {}, 1);\n", 10 + d));
    }
    for u in 0..60 {
        extra.push_str(&format!(
            "INSERT INTO dim_user VALUES ({u}, '{age}', 'Country {c:02}');\n",
            age = ["18-24", "25-34", "35-44"][u % 3],
            c = u % 20
        ));
    }
    load_fixture(&pool, &extra).await;

    let (base, _handle) = start_server().await;
    let client = Client::new();

    // Health
    let health = get_json(&client, format!("{base}/api/health")).await;
    assert_eq!(health["status"], "BI Dashboard running");

    // Totals: row counts of the whole tables
    let stats = get_json(&client, format!("{base}/api/stats")).await;
    assert_eq!(stats, json!({ "users": 60, "movies": 16, "views": 56 }));

    // Genre distribution: capped at 10, metric descending
    let genres = get_json(&client, format!("{base}/api/charts/genre-distribution")).await;
    let genres = genres.as_array().unwrap();
    assert_eq!(genres.len(), 10);
    assert_eq!(genres[0], json!({ "genre": "Drama", "views": 150 }));
    assert_eq!(genres[1], json!({ "genre": "Genre 11", "views": 120 }));
    let views: Vec<i64> = genres.iter().map(|g| g["views"].as_i64().unwrap()).collect();
    assert!(views.windows(2).all(|w| w[0] >= w[1]));

    // Top movies: same-title movies stay separate rows
    let top = get_json(&client, format!("{base}/api/charts/top-movies")).await;
    let top = top.as_array().unwrap();
    assert_eq!(top.len(), 10);
    assert_eq!(top[0], json!({ "title": "Test Movie", "views": 150 }));
    let twins = top.iter().filter(|m| m["title"] == "Twin").count();
    assert!(twins == 0 || twins == 2, "Twin rows merged: {twins}");

    // Timelines: capped at 30, chronological, revenue = views * 0.05
    let timeline = get_json(&client, format!("{base}/api/charts/views-over-time")).await;
    let revenue = get_json(&client, format!("{base}/api/charts/revenue-timeline")).await;
    let timeline = timeline.as_array().unwrap();
    let revenue = revenue.as_array().unwrap();
    assert_eq!(timeline.len(), 30);
    assert_eq!(revenue.len(), 30);
    assert_eq!(timeline[0], json!({ "date": "2024-01-01", "views": 100 }));
    assert_eq!(revenue[0], json!({ "date": "2024-01-01", "total_revenue": 5.0 }));
    assert_eq!(revenue[1], json!({ "date": "2024-01-02", "total_revenue": 2.5 }));
    let dates: Vec<&str> = timeline.iter().map(|r| r["date"].as_str().unwrap()).collect();
    assert!(dates.windows(2).all(|w| w[0] < w[1]));
    for (views, money) in timeline.iter().zip(revenue) {
        assert_eq!(views["date"], money["date"]);
        let expected = views["views"].as_f64().unwrap() * 0.05;
        let actual = money["total_revenue"].as_f64().unwrap();
        assert!((expected - actual).abs() < 1e-9, "{expected} vs {actual}");
    }

    // User distribution: unbounded, one row per age group
    let ages = get_json(&client, format!("{base}/api/charts/user-distribution")).await;
    assert_eq!(
        ages,
        json!([
            { "age_group": "18-24", "count": 20 },
            { "age_group": "25-34", "count": 20 },
            { "age_group": "35-44", "count": 20 }
        ])
    );

    // Users by country: capped at 15, ties broken by country ascending
    let countries = get_json(&client, format!("{base}/api/charts/users-by-country")).await;
    let countries = countries.as_array().unwrap();
    assert_eq!(countries.len(), 15);
    assert_eq!(countries[0], json!({ "country": "Country 00", "user_count": 3 }));
    assert_eq!(countries[14]["country"], "Country 14");
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL pointing to a dedicated test database"]
async fn single_movie_dataset() {
    let _guard = WAREHOUSE_LOCK.lock().await;
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(2)
        .connect(&database_url())
        .await
        .expect("pool");
    load_fixture(&pool, "").await;

    let (base, _handle) = start_server().await;
    let client = Client::new();

    let top = get_json(&client, format!("{base}/api/charts/top-movies")).await;
    assert_eq!(top, json!([{ "title": "Test Movie", "views": 150 }]));

    let revenue = get_json(&client, format!("{base}/api/charts/revenue-timeline")).await;
    assert_eq!(
        revenue,
        json!([
            { "date": "2024-01-01", "total_revenue": 5.0 },
            { "date": "2024-01-02", "total_revenue": 2.5 }
        ])
    );

    let ages = get_json(&client, format!("{base}/api/charts/user-distribution")).await;
    assert_eq!(ages, json!([]));
}
