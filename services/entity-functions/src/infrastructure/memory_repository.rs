/// プロセス内エンティティストア
///
/// local_serverでDynamoDBの代わりに使用する。登録が成功するたびに
/// 1件の変更バッチを全購読者へ配信し、DynamoDB Streamsの挙動を模倣する。
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use tokio::sync::mpsc;
use tracing::debug;

use crate::domain::{ChangeBatch, Entity};
use crate::infrastructure::{ChangeFeed, ChangeSubscription, EntityRepository, RepositoryError};

/// EntityRepositoryとChangeFeedのインメモリ実装
#[derive(Debug, Default)]
pub struct InMemoryEntityRepository {
    /// 保存されたエンティティ: id -> Entity
    entities: Mutex<HashMap<String, Entity>>,
    /// 変更フィードの購読者
    subscribers: Mutex<Vec<mpsc::UnboundedSender<ChangeBatch>>>,
}

impl InMemoryEntityRepository {
    /// 空のストアを作成
    pub fn new() -> Self {
        Self::default()
    }

    /// 保存件数
    ///
    /// マップは単一の`insert`でしか更新されず途中状態を残さないため、
    /// ロックが汚染されていても中身をそのまま数える。
    pub fn len(&self) -> usize {
        self.entities
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// 保存件数が0かどうか
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock_entities(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<String, Entity>>, RepositoryError> {
        self.entities
            .lock()
            .map_err(|_| RepositoryError::Unavailable("entity map lock poisoned".to_string()))
    }

    /// 全購読者に変更バッチを配信し、受信側が破棄された購読者を取り除く
    ///
    /// ロック順は常に entities → subscribers。
    fn publish(&self, batch: ChangeBatch) {
        let Ok(mut subscribers) = self.subscribers.lock() else {
            return;
        };
        subscribers.retain(|tx| tx.send(batch.clone()).is_ok());
        debug!(subscriber_count = subscribers.len(), "変更バッチを配信");
    }
}

#[async_trait]
impl EntityRepository for InMemoryEntityRepository {
    async fn insert(&self, entity: &Entity) -> Result<Entity, RepositoryError> {
        let mut entities = self.lock_entities()?;
        if entities.contains_key(&entity.id) {
            return Err(RepositoryError::AlreadyExists(entity.id.clone()));
        }
        entities.insert(entity.id.clone(), entity.clone());

        // 配信はマップのロック内で行う（配信順 = コミット順）
        self.publish(ChangeBatch::from(vec![entity.clone()]));
        Ok(entity.clone())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Entity>, RepositoryError> {
        Ok(self.lock_entities()?.get(id).cloned())
    }
}

#[async_trait]
impl ChangeFeed for InMemoryEntityRepository {
    async fn subscribe(&self) -> Result<ChangeSubscription, RepositoryError> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers
            .lock()
            .map_err(|_| RepositoryError::Unavailable("subscriber lock poisoned".to_string()))?
            .push(tx);
        Ok(ChangeSubscription::new(rx))
    }
}
