/// 変更フィードリスナー
///
/// 変更バッチを受け取り、件数と先頭ドキュメントのidをログに記録する。
/// 書き込みは行わず、再試行・再配信は呼び出し元のトリガーランタイムに委ねる。
use tracing::info;

use crate::domain::ChangeBatch;
use crate::infrastructure::ChangeSubscription;

/// 変更フィードのバッチを処理するリスナー
#[derive(Debug, Clone, Default)]
pub struct ChangeListener;

impl ChangeListener {
    /// 新しいChangeListenerを作成
    pub fn new() -> Self {
        Self
    }

    /// 変更バッチを1つ処理
    ///
    /// 常に受信ログを1行出力する。バッチが存在し空でない場合のみ、
    /// 件数、先頭ドキュメントidの順に1行ずつ追加で出力する。
    pub fn handle(&self, batch: Option<&ChangeBatch>) {
        info!("変更フィードからイベントを受信");

        let Some(batch) = batch.filter(|batch| !batch.is_empty()) else {
            return;
        };

        info!(document_count = batch.len(), "変更されたドキュメント数");
        if let Some(first) = batch.first() {
            info!(first_document_id = %first.id, "先頭ドキュメントID");
        }
    }

    /// 購読が終了するまで変更バッチを処理し続ける
    ///
    /// # Returns
    /// 処理したバッチ数
    pub async fn run(&self, mut subscription: ChangeSubscription) -> usize {
        let mut handled = 0;
        while let Some(batch) = subscription.next_batch().await {
            self.handle(Some(&batch));
            handled += 1;
        }
        info!(batch_count = handled, "変更フィードの購読が終了");
        handled
    }
}
