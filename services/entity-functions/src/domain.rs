// Domain layer modules
pub mod change_batch;
pub mod entity;

// Re-exports
pub use change_batch::ChangeBatch;
pub use entity::{Entity, EntityParseError, EntityValidationError};
