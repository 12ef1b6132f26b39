//! Users' comments endpoint

use axum::{
    Router,
    extract::State,
    response::{IntoResponse, Json, Response},
    routing::get,
};
use axum_extra::extract::{Query, QueryRejection};
use prometheus::HistogramTimer;

use super::dto::CommentResponse;
use super::params::UsersCommentsParams;
use crate::AppState;
use crate::error::AppError;
use crate::metrics::{
    COMMENTS_RETURNED, DB_QUERIES_TOTAL, DB_QUERY_DURATION_SECONDS, HTTP_REQUEST_DURATION_SECONDS,
    HTTP_REQUESTS_TOTAL,
};
use crate::service::{CommentQueryService, FilterSpec};

/// Create the users' comments router
///
/// Served at both `/` and `/comments`.
pub fn comments_router() -> Router<AppState> {
    Router::new()
        .route("/", get(users_comments))
        .route("/comments", get(users_comments))
}

/// GET /comments?usernames[]=..&sort_by_date=true
///
/// Every response, successful or not, is counted under its status code.
pub async fn users_comments(
    State(state): State<AppState>,
    query: Result<Query<UsersCommentsParams>, QueryRejection>,
) -> Response {
    // Start timing the request
    let _timer = HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&["GET", "/comments"])
        .start_timer();

    let response = match fetch_users_comments(&state, query).await {
        Ok(comments) => Json(comments).into_response(),
        Err(error) => error.into_response(),
    };

    HTTP_REQUESTS_TOTAL
        .with_label_values(&["GET", "/comments", response.status().as_str()])
        .inc();

    response
}

async fn fetch_users_comments(
    state: &AppState,
    query: Result<Query<UsersCommentsParams>, QueryRejection>,
) -> Result<Vec<CommentResponse>, AppError> {
    // Unparseable query strings get the same JSON 400 as bad flag values
    let Query(params) = query.map_err(|rejection| AppError::Validation(rejection.to_string()))?;

    let filter = params.into_filter(state.config.query.max_usernames)?;
    let service = CommentQueryService::new(state.db.clone());

    let db_timer = storage_timer(&filter);
    let comments = service.users_comments(&filter).await?;
    if let Some(timer) = db_timer {
        timer.observe_duration();
    }

    COMMENTS_RETURNED
        .with_label_values(&[if filter.sort_by_date { "true" } else { "false" }])
        .observe(comments.len() as f64);

    Ok(comments.into_iter().map(CommentResponse::from).collect())
}

/// Count and time the storage read for `filter`
///
/// `None` for an empty username set, which never reaches storage.
fn storage_timer(filter: &FilterSpec) -> Option<HistogramTimer> {
    if filter.usernames.is_empty() {
        return None;
    }

    DB_QUERIES_TOTAL
        .with_label_values(&["SELECT", "comments"])
        .inc();
    Some(
        DB_QUERY_DURATION_SECONDS
            .with_label_values(&["SELECT", "comments"])
            .start_timer(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::data::{Database, NewComment};
    use crate::metrics::ERRORS_TOTAL;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use chrono::{Duration, Utc};
    use std::sync::Arc;
    use tempfile::TempDir;
    use tower::ServiceExt;

    async fn test_state() -> (AppState, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let db = Database::connect(&db_path).await.unwrap();

        let clara = db.insert_author("Clara").await.unwrap();
        let michmich = db.insert_author("Michmich").await.unwrap();
        let post = db.insert_post(None).await.unwrap();
        for (author, days_ago) in [(&clara, 0), (&michmich, 30), (&michmich, 60)] {
            db.insert_comment(&NewComment {
                post_id: post.id,
                author_id: author.id,
                created_at: Some(Utc::now() - Duration::days(days_ago)),
            })
            .await
            .unwrap();
        }

        let mut config = AppConfig::with_database_path(db_path);
        config.query.max_usernames = 2;
        let state = AppState {
            config: Arc::new(config),
            db: Arc::new(db),
        };
        (state, temp_dir)
    }

    async fn send_get(state: AppState, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = comments_router()
            .with_state(state)
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn no_usernames_returns_empty_array() {
        let (state, _temp_dir) = test_state().await;

        let (status, json) = send_get(state, "/").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, serde_json::json!([]));
    }

    #[tokio::test]
    async fn sorted_comments_for_one_author() {
        let (state, _temp_dir) = test_state().await;

        let (status, json) = send_get(
            state,
            "/comments?usernames%5B%5D=Michmich&sort_by_date=true",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let ids: Vec<i64> = json
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["id"].as_i64().unwrap())
            .collect();
        assert_eq!(ids, vec![3, 2]);
        assert_eq!(json[0]["author_username"], "Michmich");
    }

    #[tokio::test]
    async fn invalid_sort_flag_is_bad_request() {
        let (state, _temp_dir) = test_state().await;

        let (status, json) = send_get(state, "/?usernames%5B%5D=Clara&sort_by_date=perhaps").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].as_str().unwrap().contains("sort_by_date"));
    }

    #[tokio::test]
    async fn too_many_usernames_is_bad_request() {
        let (state, _temp_dir) = test_state().await;

        let (status, _json) = send_get(state, "/?usernames=a&usernames=b&usernames=c").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn repeated_sort_flag_is_json_bad_request() {
        let (state, _temp_dir) = test_state().await;
        let errors_before = ERRORS_TOTAL.with_label_values(&["validation"]).get();

        let (status, json) = send_get(
            state,
            "/?usernames=Clara&sort_by_date=true&sort_by_date=false",
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].is_string());
        assert!(ERRORS_TOTAL.with_label_values(&["validation"]).get() > errors_before);
    }

    #[tokio::test]
    async fn rejected_requests_are_counted_by_status() {
        let (state, _temp_dir) = test_state().await;
        let bad_requests = || {
            HTTP_REQUESTS_TOTAL
                .with_label_values(&["GET", "/comments", "400"])
                .get()
        };
        let before = bad_requests();

        let (status, _json) = send_get(state, "/?sort_by_date=perhaps").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(bad_requests() > before);
    }

    #[test]
    fn storage_timer_only_for_non_empty_filters() {
        assert!(storage_timer(&FilterSpec::new(Vec::<String>::new(), true)).is_none());
        assert!(storage_timer(&FilterSpec::new(["Clara"], false)).is_some());
    }
}
