/// DynamoDBでエンティティを管理するためのエンティティリポジトリ
///
/// テーブルは `id`（文字列）をハッシュキーとする単一キースキーマを前提とする。
/// `id`が主キー兼パーティションキーのため、取得は常にGetItemによる点検索。
use async_trait::async_trait;
use aws_sdk_dynamodb::Client as DynamoDbClient;
use aws_sdk_dynamodb::error::{DisplayErrorContext, SdkError};
use aws_sdk_dynamodb::types::AttributeValue;
use std::collections::HashMap;
use thiserror::Error;

use crate::domain::Entity;
use crate::infrastructure::DynamoDbConfig;

/// エンティティリポジトリ操作のエラー型
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RepositoryError {
    /// 同じidのエンティティが既に存在する
    #[error("Entity already exists: {0}")]
    AlreadyExists(String),

    /// ストアに到達できない（接続失敗・タイムアウト）
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// 書き込みに失敗
    #[error("Write error: {0}")]
    WriteError(String),

    /// 読み取りに失敗
    #[error("Read error: {0}")]
    ReadError(String),

    /// アイテムとエンティティの変換に失敗
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// エンティティ永続化用トレイト
///
/// 実DynamoDB実装とインメモリ実装（ローカル開発・テスト用）を差し替え可能にする。
#[async_trait]
pub trait EntityRepository: Send + Sync {
    /// エンティティを新規登録し、保存したエンティティを返す
    ///
    /// # 戻り値
    /// * `Ok(Entity)` - 保存されたエンティティ
    /// * `Err(RepositoryError::AlreadyExists)` - 同一idが既に存在
    /// * `Err(RepositoryError)` - その他の失敗
    async fn insert(&self, entity: &Entity) -> Result<Entity, RepositoryError>;

    /// idで1件取得（idをキー兼パーティションキーとして使用）
    ///
    /// # 戻り値
    /// * 見つかった場合は`Ok(Some(Entity))`
    /// * 見つからなかった場合は`Ok(None)`
    async fn get_by_id(&self, id: &str) -> Result<Option<Entity>, RepositoryError>;
}

/// EntityRepositoryのDynamoDB実装
#[derive(Debug, Clone)]
pub struct DynamoEntityRepository {
    /// DynamoDBクライアント
    client: DynamoDbClient,
    /// エンティティテーブル名
    table_name: String,
}

impl DynamoEntityRepository {
    /// 新しいDynamoEntityRepositoryを作成
    pub fn new(client: DynamoDbClient, table_name: String) -> Self {
        Self { client, table_name }
    }

    /// DynamoDbConfigから作成
    pub fn from_config(config: &DynamoDbConfig) -> Self {
        Self::new(config.client().clone(), config.table_name().to_string())
    }

    /// エンティティをDynamoDBアイテムに変換
    fn to_item(entity: &Entity) -> Result<HashMap<String, AttributeValue>, RepositoryError> {
        serde_dynamo::to_item(entity)
            .map_err(|e| RepositoryError::SerializationError(e.to_string()))
    }

    /// DynamoDBアイテムからエンティティを復元
    fn from_item(item: HashMap<String, AttributeValue>) -> Result<Entity, RepositoryError> {
        serde_dynamo::from_item(item)
            .map_err(|e| RepositoryError::SerializationError(e.to_string()))
    }
}

/// 接続失敗・タイムアウトなどサービスに到達していないエラーかどうか
fn is_connectivity_error<E, R>(err: &SdkError<E, R>) -> bool {
    matches!(
        err,
        SdkError::DispatchFailure(_) | SdkError::TimeoutError(_)
    )
}

#[async_trait]
impl EntityRepository for DynamoEntityRepository {
    async fn insert(&self, entity: &Entity) -> Result<Entity, RepositoryError> {
        let item = Self::to_item(entity)?;

        // 条件: 同じidが存在しない場合のみ
        let result = self
            .client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item))
            .condition_expression("attribute_not_exists(id)")
            .send()
            .await;

        match result {
            Ok(_) => Ok(entity.clone()),
            Err(err) => {
                if is_connectivity_error(&err) {
                    return Err(RepositoryError::Unavailable(
                        DisplayErrorContext(&err).to_string(),
                    ));
                }
                let service_error = err.into_service_error();
                if service_error.is_conditional_check_failed_exception() {
                    return Err(RepositoryError::AlreadyExists(entity.id.clone()));
                }
                Err(RepositoryError::WriteError(service_error.to_string()))
            }
        }
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Entity>, RepositoryError> {
        let result = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key("id", AttributeValue::S(id.to_string()))
            .send()
            .await;

        let output = match result {
            Ok(output) => output,
            Err(err) if is_connectivity_error(&err) => {
                return Err(RepositoryError::Unavailable(
                    DisplayErrorContext(&err).to_string(),
                ));
            }
            Err(err) => {
                return Err(RepositoryError::ReadError(
                    err.into_service_error().to_string(),
                ));
            }
        };

        output.item.map(Self::from_item).transpose()
    }
}
