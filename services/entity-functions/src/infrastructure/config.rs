/// ドキュメントストア接続設定
///
/// 設定は固定名の3つの環境変数のみ:
/// - ENTITIES_DATABASE_NAME: 論理データベース名（テーブル名の名前空間、デフォルト: entities_db）
/// - ENTITIES_COLLECTION_NAME: コレクション名（デフォルト: entities）
/// - ENTITIES_DB_CONNECTION: 接続文字列（DynamoDBエンドポイントURL、未設定時はAWS標準エンドポイント）
///
/// 物理テーブル名は `<database>.<collection>` となる。
use aws_sdk_dynamodb::Client as DynamoDbClient;
use thiserror::Error;

/// 論理データベース名の環境変数
pub const DATABASE_NAME_ENV: &str = "ENTITIES_DATABASE_NAME";

/// コレクション名の環境変数
pub const COLLECTION_NAME_ENV: &str = "ENTITIES_COLLECTION_NAME";

/// 接続文字列の環境変数
pub const CONNECTION_ENV: &str = "ENTITIES_DB_CONNECTION";

/// デフォルトの論理データベース名
pub const DEFAULT_DATABASE_NAME: &str = "entities_db";

/// デフォルトのコレクション名
pub const DEFAULT_COLLECTION_NAME: &str = "entities";

/// DynamoDBテーブル名の長さ制約
const TABLE_NAME_MIN_LEN: usize = 3;
const TABLE_NAME_MAX_LEN: usize = 255;

/// ストア設定のエラー型
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreConfigError {
    #[error("Invalid value for {name}: {reason}")]
    InvalidValue { name: String, reason: String },
}

impl StoreConfigError {
    fn invalid(name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

/// 環境変数から読み込んだストア設定（AWSクライアント生成前の純粋な値）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreSettings {
    database_name: String,
    collection_name: String,
    connection: Option<String>,
}

impl StoreSettings {
    /// 値を検証してStoreSettingsを作成
    ///
    /// 空文字列の接続文字列は未設定として扱う。
    pub fn new(
        database_name: impl Into<String>,
        collection_name: impl Into<String>,
        connection: Option<String>,
    ) -> Result<Self, StoreConfigError> {
        let database_name = database_name.into();
        let collection_name = collection_name.into();

        validate_name_part(DATABASE_NAME_ENV, &database_name)?;
        validate_name_part(COLLECTION_NAME_ENV, &collection_name)?;

        let connection = connection
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());
        if let Some(url) = &connection {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(StoreConfigError::invalid(
                    CONNECTION_ENV,
                    "endpoint URL must start with http:// or https://",
                ));
            }
        }

        let settings = Self {
            database_name,
            collection_name,
            connection,
        };

        let table_len = settings.table_name().len();
        if !(TABLE_NAME_MIN_LEN..=TABLE_NAME_MAX_LEN).contains(&table_len) {
            return Err(StoreConfigError::invalid(
                COLLECTION_NAME_ENV,
                format!(
                    "table name must be {}..={} characters, got {}",
                    TABLE_NAME_MIN_LEN, TABLE_NAME_MAX_LEN, table_len
                ),
            ));
        }

        Ok(settings)
    }

    /// 環境変数から設定を読み込む
    pub fn from_env() -> Result<Self, StoreConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 任意のキー参照関数から設定を読み込む（未設定の名前はデフォルト値）
    pub fn from_lookup<F>(lookup: F) -> Result<Self, StoreConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_name =
            lookup(DATABASE_NAME_ENV).unwrap_or_else(|| DEFAULT_DATABASE_NAME.to_string());
        let collection_name =
            lookup(COLLECTION_NAME_ENV).unwrap_or_else(|| DEFAULT_COLLECTION_NAME.to_string());
        let connection = lookup(CONNECTION_ENV);

        Self::new(database_name, collection_name, connection)
    }

    /// 論理データベース名
    pub fn database_name(&self) -> &str {
        &self.database_name
    }

    /// コレクション名
    pub fn collection_name(&self) -> &str {
        &self.collection_name
    }

    /// エンドポイントURLの上書き（DynamoDB Local等）
    pub fn endpoint_url(&self) -> Option<&str> {
        self.connection.as_deref()
    }

    /// 物理テーブル名
    pub fn table_name(&self) -> String {
        format!("{}.{}", self.database_name, self.collection_name)
    }
}

/// テーブル名の構成要素がDynamoDBの命名規則（[A-Za-z0-9_.-]）に従うか検証
fn validate_name_part(name: &str, value: &str) -> Result<(), StoreConfigError> {
    if value.is_empty() {
        return Err(StoreConfigError::invalid(name, "must not be empty"));
    }
    if let Some(c) = value
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-')))
    {
        return Err(StoreConfigError::invalid(
            name,
            format!("unsupported character {:?}", c),
        ));
    }
    Ok(())
}

/// テーブル名とクライアントを持つDynamoDB設定
#[derive(Debug, Clone)]
pub struct DynamoDbConfig {
    /// DynamoDBクライアントインスタンス
    client: DynamoDbClient,
    /// エンティティテーブル名
    table_name: String,
}

impl DynamoDbConfig {
    /// ストア設定からAWS設定を読み込み、DynamoDbConfigを作成
    ///
    /// 認証情報とリージョンはaws-configの標準プロバイダーチェーンから取得する。
    pub async fn from_settings(settings: &StoreSettings) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(url) = settings.endpoint_url() {
            loader = loader.endpoint_url(url);
        }
        let aws_config = loader.load().await;

        Self {
            client: DynamoDbClient::new(&aws_config),
            table_name: settings.table_name(),
        }
    }

    /// 明示的な値で新しいDynamoDbConfigを作成（テスト用）
    pub fn new(client: DynamoDbClient, table_name: String) -> Self {
        Self { client, table_name }
    }

    /// DynamoDBクライアントへの参照を取得
    pub fn client(&self) -> &DynamoDbClient {
        &self.client
    }

    /// テーブル名を取得
    pub fn table_name(&self) -> &str {
        &self.table_name
    }
}
