/// 変更フィードリスナー Lambda関数
///
/// エンティティテーブルのDynamoDB Streamsイベントを受け取り、
/// バッチの件数と先頭ドキュメントのidをログに記録する。
/// リースとチェックポイントはイベントソースマッピング側が管理する。
use aws_lambda_events::event::dynamodb::Event;
use entity_functions::application::ChangeListener;
use entity_functions::infrastructure::{init_logging, DynamoStreamDecoder};
use lambda_runtime::{service_fn, Error, LambdaEvent};
use tracing::error;

#[tokio::main]
async fn main() -> Result<(), Error> {
    // 構造化ログを初期化
    init_logging();

    // Lambda関数を初期化して実行
    let func = service_fn(handler);
    lambda_runtime::run(func).await?;
    Ok(())
}

/// Lambda関数のメインハンドラー
///
/// # 処理フロー
/// 1. ストリームレコードをChangeBatchにデコード（REMOVEはスキップ）
/// 2. ChangeListenerでバッチをログに記録（呼び出しごとのログ行はChangeListenerのみが出力）
///
/// デコードできないレコードが1件でもあればエラーを返し、Lambda再試行をトリガーする。
async fn handler(event: LambdaEvent<Event>) -> Result<(), Error> {
    let batch = match DynamoStreamDecoder::decode(&event.payload) {
        Ok(batch) => batch,
        Err(err) => {
            error!(error = %err, "ストリームレコードのデコード失敗");
            return Err(err.into());
        }
    };

    ChangeListener::new().handle(Some(&batch));
    Ok(())
}
