/// エンティティ登録ハンドラー
///
/// リクエストボディをエンティティとして解析し、リポジトリに登録する。
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

use crate::domain::{Entity, EntityParseError, EntityValidationError};
use crate::infrastructure::{EntityRepository, RepositoryError};

/// 登録処理のエラー型
#[derive(Debug, Error)]
pub enum InsertError {
    /// リクエストボディが不正なJSON
    #[error("リクエストボディの解析に失敗: {0}")]
    Parse(#[from] EntityParseError),

    /// idが空
    #[error("エンティティの検証に失敗: {0}")]
    Validation(#[from] EntityValidationError),

    /// ストアへの登録に失敗
    #[error("エンティティの保存に失敗: {0}")]
    Repository(#[from] RepositoryError),
}

/// POST /api/entities を処理するハンドラー
pub struct InsertHandler<R>
where
    R: EntityRepository + ?Sized,
{
    /// エンティティリポジトリ
    repository: Arc<R>,
}

impl<R> InsertHandler<R>
where
    R: EntityRepository + ?Sized,
{
    /// 新しいInsertHandlerを作成
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// リクエストボディを処理して登録済みエンティティを返す
    ///
    /// # 処理フロー
    /// 1. ボディ全体をUTF-8のJSONとしてエンティティに解析（未知フィールドは無視）
    /// 2. idが空でないことを検証
    /// 3. リポジトリに登録
    pub async fn handle(&self, body: &[u8]) -> Result<Entity, InsertError> {
        let entity = Entity::from_slice(body)?;
        entity.validate()?;

        debug!(entity_id = %entity.id, "エンティティを登録");
        let stored = self.repository.insert(&entity).await?;

        info!(entity_id = %stored.id, "エンティティを登録しました");
        Ok(stored)
    }
}
