// Infrastructure layer modules
pub mod change_feed;
pub mod change_stream;
pub mod config;
pub mod entity_repository;
pub mod logging;
pub mod memory_repository;

// Re-exports
pub use change_feed::{ChangeFeed, ChangeSubscription};
pub use change_stream::{ChangeStreamError, DynamoStreamDecoder};
pub use config::{DynamoDbConfig, StoreConfigError, StoreSettings};
pub use entity_repository::{DynamoEntityRepository, EntityRepository, RepositoryError};
pub use logging::init_logging;
pub use memory_repository::InMemoryEntityRepository;
