// アプリケーション層モジュール
pub mod api_error;
pub mod change_listener;
pub mod fetch_handler;
pub mod http_api;
pub mod insert_handler;

// 再エクスポート
pub use api_error::{ApiError, ApiErrorBody};
pub use change_listener::ChangeListener;
pub use fetch_handler::{FetchError, FetchHandler};
pub use http_api::{create_router, AppState, ENTITIES_PATH};
pub use insert_handler::{InsertError, InsertHandler};
