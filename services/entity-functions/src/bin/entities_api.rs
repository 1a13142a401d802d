/// エンティティHTTP API Lambdaエントリポイント
///
/// Lambda Function URL / API Gateway経由のHTTPリクエストをaxumルーターで処理する。
/// - POST /api/entities
/// - GET /api/entities/{id}
use entity_functions::application::create_router;
use entity_functions::infrastructure::{
    init_logging, DynamoDbConfig, DynamoEntityRepository, StoreSettings,
};
use lambda_http::{run, Error};
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Error> {
    // 構造化ログを初期化
    init_logging();

    // ストア設定を環境変数から読み込み
    let settings = match StoreSettings::from_env() {
        Ok(settings) => settings,
        Err(err) => {
            error!(error = %err, "ストア設定読み込み失敗");
            return Err(err.into());
        }
    };

    info!(
        table_name = %settings.table_name(),
        custom_endpoint = settings.endpoint_url().is_some(),
        "エンティティAPI Lambda関数を初期化"
    );

    // DynamoDBクライアントはコールドスタート時に1度だけ作成し、呼び出し間で共有する
    let config = DynamoDbConfig::from_settings(&settings).await;
    let repository = Arc::new(DynamoEntityRepository::from_config(&config));

    run(create_router(repository)).await
}
