//! エンティティHTTP API
//!
//! - エンティティの登録 (POST /api/entities)
//! - エンティティの取得 (GET /api/entities/{id})
//!
//! Lambda（lambda_http）とlocal_server（axum::serve）で同じルーターを使う。

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::application::{ApiError, FetchHandler, InsertHandler};
use crate::infrastructure::EntityRepository;

/// エンティティコレクションのパス
pub const ENTITIES_PATH: &str = "/api/entities";

/// アプリケーション状態
///
/// ルーター全体で共有される状態を保持する。呼び出し間で可変状態は共有しない。
#[derive(Clone)]
pub struct AppState {
    insert_handler: Arc<InsertHandler<dyn EntityRepository>>,
    fetch_handler: Arc<FetchHandler<dyn EntityRepository>>,
}

impl AppState {
    /// リポジトリから状態を作成
    pub fn new(repository: Arc<dyn EntityRepository>) -> Self {
        Self {
            insert_handler: Arc::new(InsertHandler::new(repository.clone())),
            fetch_handler: Arc::new(FetchHandler::new(repository)),
        }
    }
}

/// エンティティ登録エンドポイント (POST /api/entities)
///
/// # Returns
/// - 200 OK: 登録したエンティティ
/// - 400 Bad Request: ボディが不正なUTF-8・JSON、またはidが空
/// - 409 Conflict: 同じidが既に存在
/// - 502 Bad Gateway / 500 Internal Server Error: ストアエラー
async fn insert_entity(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<crate::domain::Entity>, ApiError> {
    info!(body_length = body.len(), "エンティティ登録リクエストを受信");

    let entity = state.insert_handler.handle(&body).await?;
    Ok(Json(entity))
}

/// エンティティ取得エンドポイント (GET /api/entities/{id})
///
/// # Returns
/// - 200 OK: エンティティ
/// - 404 Not Found: 存在しない（ボディなし）
/// - 502 Bad Gateway / 500 Internal Server Error: ストアエラー
async fn get_entity(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    info!(entity_id = %id, "エンティティ取得リクエストを受信");

    match state.fetch_handler.handle(&id).await {
        Ok(Some(entity)) => Json(entity).into_response(),
        Ok(None) => {
            info!(entity_id = %id, "エンティティが見つからない");
            StatusCode::NOT_FOUND.into_response()
        }
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// ルーターを構築する
///
/// TraceLayerによりリクエスト/レスポンスの構造化ログを自動記録する。
pub fn create_router(repository: Arc<dyn EntityRepository>) -> Router {
    Router::new()
        .route(ENTITIES_PATH, post(insert_entity))
        .route(&format!("{}/{{id}}", ENTITIES_PATH), get(get_entity))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState::new(repository))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ApiErrorBody;
    use crate::domain::Entity;
    use crate::infrastructure::entity_repository::tests::MockEntityRepository;
    use crate::infrastructure::{InMemoryEntityRepository, RepositoryError};
    use axum::body::Body;
    use axum::http::{header, Request};
    use chrono::Utc;
    use serde_json::Value;
    use tower::ServiceExt;

    fn post_request(body: &str) -> Request<Body> {
        Request::builder()
            .uri("/api/entities")
            .method("POST")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_request(id: &str) -> Request<Body> {
        Request::builder()
            .uri(format!("/api/entities/{}", id))
            .method("GET")
            .body(Body::empty())
            .unwrap()
    }

    async fn body_bytes(response: Response) -> Vec<u8> {
        axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec()
    }

    // ========================================
    // POST /api/entities
    // ========================================

    #[tokio::test]
    async fn test_post_returns_inserted_entity() {
        let app = create_router(Arc::new(InMemoryEntityRepository::new()));
        let received_at = Utc::now();

        let response = app
            .oneshot(post_request(r#"{"id":"a1","name":"widget"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(body["id"], "a1");
        assert_eq!(body["name"], "widget");

        let created_at: chrono::DateTime<Utc> =
            serde_json::from_value(body["createdAt"].clone()).unwrap();
        assert!(created_at >= received_at);
    }

    #[tokio::test]
    async fn test_post_then_get_returns_same_entity() {
        let app = create_router(Arc::new(InMemoryEntityRepository::new()));

        let response = app
            .clone()
            .oneshot(post_request(r#"{"id":"a1","name":"widget"}"#))
            .await
            .unwrap();
        let inserted: Entity = serde_json::from_slice(&body_bytes(response).await).unwrap();

        let response = app.oneshot(get_request("a1")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let fetched: Entity = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(fetched, inserted);
    }

    #[tokio::test]
    async fn test_post_malformed_json_returns_400() {
        let app = create_router(Arc::new(InMemoryEntityRepository::new()));

        let response = app.oneshot(post_request("{\"id\":")).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(body["error"], "bad_request");
    }

    #[tokio::test]
    async fn test_post_invalid_utf8_returns_json_400() {
        let repo = Arc::new(InMemoryEntityRepository::new());
        let app = create_router(repo.clone());

        let request = Request::builder()
            .uri("/api/entities")
            .method("POST")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(vec![b'{', 0xff, 0xfe, b'}']))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
        let body: ApiErrorBody = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(body.error, "bad_request");
        assert!(repo.is_empty());
    }

    #[tokio::test]
    async fn test_post_without_id_returns_400() {
        let repo = Arc::new(InMemoryEntityRepository::new());
        let app = create_router(repo.clone());

        let response = app
            .oneshot(post_request(r#"{"name":"nameless"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(repo.is_empty());
    }

    #[tokio::test]
    async fn test_post_duplicate_id_returns_409() {
        let app = create_router(Arc::new(InMemoryEntityRepository::new()));
        app.clone()
            .oneshot(post_request(r#"{"id":"a1"}"#))
            .await
            .unwrap();

        let response = app.oneshot(post_request(r#"{"id":"a1"}"#)).await.unwrap();

        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_post_store_unavailable_returns_502() {
        let repo = Arc::new(MockEntityRepository::new());
        repo.set_next_error(RepositoryError::Unavailable("connection refused".to_string()));
        let app = create_router(repo);

        let response = app.oneshot(post_request(r#"{"id":"a1"}"#)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert!(!body["message"].as_str().unwrap().contains("connection refused"));
    }

    // ========================================
    // GET /api/entities/{id}
    // ========================================

    #[tokio::test]
    async fn test_get_unknown_returns_404_with_empty_body() {
        let app = create_router(Arc::new(InMemoryEntityRepository::new()));

        let response = app.oneshot(get_request("unknown")).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(body_bytes(response).await.is_empty());
    }

    #[tokio::test]
    async fn test_get_store_failure_returns_500() {
        let repo = Arc::new(MockEntityRepository::new());
        repo.set_next_error(RepositoryError::ReadError("ValidationException".to_string()));
        let app = create_router(repo);

        let response = app.oneshot(get_request("a1")).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_unknown_route_returns_404() {
        let app = create_router(Arc::new(InMemoryEntityRepository::new()));

        let request = Request::builder()
            .uri("/api/unknown")
            .method("GET")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
