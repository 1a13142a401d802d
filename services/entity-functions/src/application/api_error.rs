//! APIエラーハンドリング
//!
//! アプリケーション層のエラーをHTTPステータスとJSONボディに変換する。
//! ストア内部の詳細はログにのみ出力し、レスポンスには含めない。

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::application::{FetchError, InsertError};
use crate::infrastructure::RepositoryError;

/// APIエラーレスポンスのボディ
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiErrorBody {
    /// エラー種別（"bad_request", "conflict", "bad_gateway", "internal_error"）
    pub error: String,
    /// 詳細メッセージ
    pub message: String,
}

/// APIエラー
#[derive(Debug, Clone)]
pub struct ApiError {
    status: StatusCode,
    body: ApiErrorBody,
}

impl ApiError {
    /// 新しいApiErrorを作成
    pub fn new(status: StatusCode, error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ApiErrorBody {
                error: error.into(),
                message: message.into(),
            },
        }
    }

    /// 400 Bad Request
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "bad_request", message)
    }

    /// 409 Conflict
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, "conflict", message)
    }

    /// 502 Bad Gateway（ストアに到達できない）
    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_GATEWAY, "bad_gateway", message)
    }

    /// 500 Internal Server Error
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
    }

    pub fn error(&self) -> &str {
        &self.body.error
    }

    pub fn message(&self) -> &str {
        &self.body.message
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::AlreadyExists(id) => {
                warn!(entity_id = %id, "同じidのエンティティが既に存在");
                ApiError::conflict(format!("エンティティは既に存在します: {}", id))
            }
            RepositoryError::Unavailable(detail) => {
                error!(error = %detail, "ストアに接続できません");
                ApiError::bad_gateway("ストアに接続できません")
            }
            other => {
                error!(error = %other, "ストア操作に失敗");
                ApiError::internal_error("ストア操作に失敗しました")
            }
        }
    }
}

impl From<InsertError> for ApiError {
    fn from(err: InsertError) -> Self {
        match err {
            InsertError::Parse(e) => {
                warn!(error = %e, "リクエストボディが不正");
                ApiError::bad_request(e.to_string())
            }
            InsertError::Validation(e) => {
                warn!(error = %e, "エンティティの検証に失敗");
                ApiError::bad_request(e.to_string())
            }
            InsertError::Repository(e) => e.into(),
        }
    }
}

impl From<FetchError> for ApiError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Repository(e) => e.into(),
        }
    }
}
