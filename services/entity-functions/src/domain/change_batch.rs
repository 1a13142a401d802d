/// 変更フィードから配信される変更バッチ
use super::Entity;

/// 変更されたエンティティの順序付きバッチ（0件以上）
///
/// バッチサイズは配信元（DynamoDB Streamsのイベントソースマッピング等）が決める。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeBatch {
    entities: Vec<Entity>,
}

impl ChangeBatch {
    /// 新しいChangeBatchを作成
    pub fn new(entities: Vec<Entity>) -> Self {
        Self { entities }
    }

    /// バッチ内のエンティティ数
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// バッチが空かどうか
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// 先頭のエンティティ
    pub fn first(&self) -> Option<&Entity> {
        self.entities.first()
    }

    /// 配信順のエンティティ一覧
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }
}

impl From<Vec<Entity>> for ChangeBatch {
    fn from(entities: Vec<Entity>) -> Self {
        Self::new(entities)
    }
}
