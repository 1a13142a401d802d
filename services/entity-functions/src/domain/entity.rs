/// エンティティ（ドキュメントストアに保存される唯一のレコード型）
///
/// HTTPボディ、DynamoDBアイテム、DynamoDB Streamsのイメージの
/// すべてで同じJSON形状を共有する:
/// `{ "id": "<string>", "name": "<string|null>", "createdAt": "<RFC 3339|null>" }`
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// リクエストボディからエンティティへの変換エラー
#[derive(Debug, Error)]
pub enum EntityParseError {
    /// JSONとして不正、または型が合わない
    #[error("JSONの解析に失敗: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// トップレベルがJSONオブジェクトではない
    #[error("JSONオブジェクトではありません")]
    NotAnObject,

    /// ボディがUTF-8として不正
    #[error("UTF-8として不正なボディ: {0}")]
    NotUtf8(#[from] std::str::Utf8Error),
}

/// エンティティの検証エラー
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EntityValidationError {
    /// idが欠損または空文字列
    #[error("idが指定されていません")]
    MissingId,
}

/// ドキュメントストアのレコード
///
/// `id`は主キー兼パーティションキー。`createdAt`はフィールド自体が
/// 省略された場合のみ現在時刻で補完され、明示的な`null`はそのまま保持される。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    /// 一意な識別子（欠損時は空文字列として読み込み、検証で弾く）
    #[serde(default)]
    pub id: String,
    /// 任意のラベル
    #[serde(default)]
    pub name: Option<String>,
    /// 作成日時（UTC）
    #[serde(default = "default_created_at")]
    pub created_at: Option<DateTime<Utc>>,
}

fn default_created_at() -> Option<DateTime<Utc>> {
    Some(Utc::now())
}

impl Entity {
    /// 現在時刻を作成日時として新しいエンティティを作成
    pub fn new(id: impl Into<String>, name: Option<String>) -> Self {
        Self {
            id: id.into(),
            name,
            created_at: default_created_at(),
        }
    }

    /// リクエストボディのJSON文字列からエンティティを生成
    ///
    /// 未知のフィールドは無視する。`id`の欠損はここではエラーにしない
    /// （[`Entity::validate`]で判定する）。
    pub fn from_json(body: &str) -> Result<Self, EntityParseError> {
        let value: Value = serde_json::from_str(body)?;
        if !value.is_object() {
            return Err(EntityParseError::NotAnObject);
        }
        Ok(serde_json::from_value(value)?)
    }

    /// リクエストボディのバイト列からエンティティを生成
    ///
    /// UTF-8として不正なバイト列は[`EntityParseError::NotUtf8`]になる。
    pub fn from_slice(body: &[u8]) -> Result<Self, EntityParseError> {
        Self::from_json(std::str::from_utf8(body)?)
    }

    /// 登録・取得に必要な不変条件（idが空でないこと）を検証
    pub fn validate(&self) -> Result<(), EntityValidationError> {
        if self.id.is_empty() {
            return Err(EntityValidationError::MissingId);
        }
        Ok(())
    }
}
