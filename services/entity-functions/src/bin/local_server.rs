/// ローカル開発用サーバー
///
/// Lambdaと同じルーターをaxum::serveで起動する。
/// `--store memory`（デフォルト）ではインメモリストアを使い、
/// 書き込みごとの変更バッチをChangeListenerに流す。
/// `--store dynamodb`では環境変数のストア設定でDynamoDBに接続する。
///
/// # ローカル実行
/// ```bash
/// # インメモリストアで起動
/// cargo run --bin local_server
///
/// # DynamoDB Localに接続
/// export ENTITIES_DB_CONNECTION=http://localhost:8000
/// cargo run --bin local_server -- --store dynamodb --bind 0.0.0.0:7071
/// ```
use clap::{Parser, ValueEnum};
use entity_functions::application::{create_router, ChangeListener};
use entity_functions::infrastructure::{
    init_logging, ChangeFeed, DynamoDbConfig, DynamoEntityRepository, EntityRepository,
    InMemoryEntityRepository, StoreSettings,
};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, warn};

/// デフォルトのリッスンアドレス
const DEFAULT_BIND: &str = "127.0.0.1:7071";

/// 使用するストア
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum StoreKind {
    /// インメモリストア（変更フィード付き）
    Memory,
    /// DynamoDB（ENTITIES_* 環境変数で設定）
    Dynamodb,
}

/// コマンドライン引数
#[derive(Parser, Debug)]
#[command(name = "local_server")]
#[command(about = "エンティティAPIをローカルで起動")]
struct CliArgs {
    /// リッスンアドレス
    #[arg(long, short = 'b', default_value = DEFAULT_BIND)]
    bind: SocketAddr,

    /// 使用するストア
    #[arg(long, short = 's', value_enum, default_value_t = StoreKind::Memory)]
    store: StoreKind,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // 構造化ログを初期化
    init_logging();

    let args = CliArgs::parse();
    info!(bind = %args.bind, store = ?args.store, "ローカルサーバーを起動します");

    let repository = match build_repository(args.store).await {
        Ok(repository) => repository,
        Err(err) => {
            error!(error = %err, "ストアの初期化に失敗");
            return Err(err);
        }
    };

    let listener = match TcpListener::bind(args.bind).await {
        Ok(listener) => listener,
        Err(err) => {
            error!(bind = %args.bind, error = %err, "アドレスのバインドに失敗");
            return Err(err.into());
        }
    };
    info!(addr = %args.bind, "リッスン開始");

    if let Err(err) = serve(listener, repository, shutdown_signal()).await {
        error!(error = %err, "サーバーがエラーで停止");
        return Err(err.into());
    }

    info!("サーバーが正常に停止しました");
    Ok(())
}

/// ストアを作成する
///
/// インメモリストアの場合は変更フィードを購読し、ChangeListenerをバックグラウンドで起動する。
async fn build_repository(
    kind: StoreKind,
) -> Result<Arc<dyn EntityRepository>, Box<dyn std::error::Error + Send + Sync>> {
    match kind {
        StoreKind::Memory => {
            let repository = Arc::new(InMemoryEntityRepository::new());
            let subscription = repository.subscribe().await?;
            tokio::spawn(async move {
                ChangeListener::new().run(subscription).await;
            });
            info!("インメモリストアを初期化しました");
            Ok(repository)
        }
        StoreKind::Dynamodb => {
            let settings = StoreSettings::from_env()?;
            let config = DynamoDbConfig::from_settings(&settings).await;
            info!(table_name = %config.table_name(), "DynamoDBストアを初期化しました");
            Ok(Arc::new(DynamoEntityRepository::from_config(&config)))
        }
    }
}

/// graceful shutdownを有効にしてルーターを提供する
async fn serve<F>(
    listener: TcpListener,
    repository: Arc<dyn EntityRepository>,
    shutdown: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, create_router(repository))
        .with_graceful_shutdown(shutdown)
        .await
}

/// シャットダウンシグナル（SIGINT / SIGTERM）を待機する
///
/// ハンドラー登録に失敗したシグナルは待機対象から外す。
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!(error = %err, "Ctrl+C シグナルハンドラーの登録に失敗しました");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "SIGTERM シグナルハンドラーの登録に失敗しました");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Ctrl+C (SIGINT) を受信しました。graceful shutdownを開始します");
        }
        _ = terminate => {
            info!("SIGTERM を受信しました。graceful shutdownを開始します");
        }
    }
}
