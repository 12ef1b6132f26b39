//! Common test utilities for E2E tests

#![allow(dead_code)]

pub mod schema_validator;

use chrono::{Duration, Utc};
use tempfile::TempDir;
use tokio::net::TcpListener;
use usercomments::data::{Author, Comment, NewComment, Post};
use usercomments::{AppState, config};

/// Test server instance
pub struct TestServer {
    pub addr: String,
    pub state: AppState,
    pub _temp_dir: TempDir,
    pub client: reqwest::Client,
}

/// Authors Clara, Michmich and Pich commenting on three posts
///
/// comment_2 is a month old and comment_4 two months old; the rest are
/// created at seeding time.
pub struct Fixture {
    pub authors: [Author; 3],
    pub posts: [Post; 3],
    pub comments: [Comment; 6],
}

impl TestServer {
    /// Create a new test server instance
    pub async fn new() -> Self {
        // Create temporary directory for test database
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");

        let config = config::AppConfig::with_database_path(db_path);

        // Initialize app state
        let state = AppState::new(config).await.unwrap();

        // Create HTTP client
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap();

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let addr_str = format!("http://{}", addr);

        let app = usercomments::build_router(state.clone());

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr: addr_str,
            state,
            _temp_dir: temp_dir,
            client,
        }
    }

    /// Get base URL for API requests
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.addr, path)
    }

    /// Seed the three-author, three-post dataset
    pub async fn seed_fixture(&self) -> Fixture {
        let db = &self.state.db;

        let clara = db.insert_author("Clara").await.unwrap();
        let michmich = db.insert_author("Michmich").await.unwrap();
        let pich = db.insert_author("Pich").await.unwrap();

        let post_1 = db.insert_post(None).await.unwrap();
        let post_2 = db.insert_post(None).await.unwrap();
        let post_3 = db.insert_post(None).await.unwrap();

        let now = Utc::now();
        let plan = [
            (&post_1, &clara, None),
            (&post_1, &michmich, Some(now - Duration::days(30))),
            (&post_2, &clara, None),
            (&post_2, &michmich, Some(now - Duration::days(60))),
            (&post_2, &pich, None),
            (&post_3, &pich, None),
        ];

        let mut comments = Vec::with_capacity(plan.len());
        for (post, author, created_at) in plan {
            let comment = db
                .insert_comment(&NewComment {
                    post_id: post.id,
                    author_id: author.id,
                    created_at,
                })
                .await
                .unwrap();
            comments.push(comment);
        }

        Fixture {
            authors: [clara, michmich, pich],
            posts: [post_1, post_2, post_3],
            comments: comments.try_into().unwrap(),
        }
    }

    /// GET the users' comments endpoint with an already encoded query string
    pub async fn get_comments(&self, query: &str) -> reqwest::Response {
        self.client
            .get(self.url(&format!("/?{query}")))
            .send()
            .await
            .unwrap()
    }
}

/// Collect the `id` field of every element of a JSON array
pub fn ids(json: &serde_json::Value) -> Vec<i64> {
    json.as_array()
        .expect("response should be a JSON array")
        .iter()
        .map(|comment| comment["id"].as_i64().expect("comment id"))
        .collect()
}
