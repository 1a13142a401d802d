/// 変更フィード購読の抽象化
///
/// Lambda上ではDynamoDB Streamsのイベントソースマッピングがバッチをプッシュするため、
/// このトレイトはプロセス内で変更を配信できるストア（ローカル開発用）が実装する。
use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::domain::ChangeBatch;
use crate::infrastructure::RepositoryError;

/// 変更バッチの遅延シーケンス
///
/// 配信元が閉じるまで無限に続き得る。一度終了したら再開できない
/// （再購読は`ChangeFeed::subscribe`で新しい購読を作る）。
#[derive(Debug)]
pub struct ChangeSubscription {
    receiver: mpsc::UnboundedReceiver<ChangeBatch>,
}

impl ChangeSubscription {
    /// 受信チャネルから購読を作成
    pub fn new(receiver: mpsc::UnboundedReceiver<ChangeBatch>) -> Self {
        Self { receiver }
    }

    /// 次の変更バッチを待機する。配信元が閉じた場合は`None`
    pub async fn next_batch(&mut self) -> Option<ChangeBatch> {
        self.receiver.recv().await
    }
}

/// 監視対象コレクションの変更を購読できるストア
#[async_trait]
pub trait ChangeFeed: Send + Sync {
    /// 購読開始以降の変更を配信する購読を作成
    async fn subscribe(&self) -> Result<ChangeSubscription, RepositoryError>;
}
