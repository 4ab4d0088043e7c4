pub mod image_client;
pub mod orchestrator;
pub mod prompt_parser;
pub mod retention;
pub mod storage;
pub mod trigger_router;

#[cfg(test)]
pub(crate) mod test_support;

pub use image_client::ImageClient;
pub use orchestrator::Orchestrator;
pub use retention::{RetentionPolicy, RetentionScheduler};
pub use storage::ImageStore;
pub use trigger_router::{Route, TriggerTable};
