/// エンティティ取得ハンドラー
///
/// idをキー兼パーティションキーとして1件だけ点検索する。
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::domain::Entity;
use crate::infrastructure::{EntityRepository, RepositoryError};

/// 取得処理のエラー型
#[derive(Debug, Error)]
pub enum FetchError {
    /// ストアからの取得に失敗（未検出はエラーではない）
    #[error("エンティティの取得に失敗: {0}")]
    Repository(#[from] RepositoryError),
}

/// GET /api/entities/{id} を処理するハンドラー
pub struct FetchHandler<R>
where
    R: EntityRepository + ?Sized,
{
    /// エンティティリポジトリ
    repository: Arc<R>,
}

impl<R> FetchHandler<R>
where
    R: EntityRepository + ?Sized,
{
    /// 新しいFetchHandlerを作成
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// idでエンティティを取得
    ///
    /// 空のidは保存され得ないため、ストアに問い合わせず未検出として扱う。
    ///
    /// # Returns
    /// * `Ok(Some(Entity))` - 見つかった
    /// * `Ok(None)` - 見つからなかった
    pub async fn handle(&self, id: &str) -> Result<Option<Entity>, FetchError> {
        if id.is_empty() {
            return Ok(None);
        }

        let entity = self.repository.get_by_id(id).await?;
        debug!(entity_id = id, found = entity.is_some(), "エンティティを検索");
        Ok(entity)
    }
}
