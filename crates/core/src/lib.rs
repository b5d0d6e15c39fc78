pub mod config;
pub mod error;
pub mod event;
pub mod ids;

pub use config::ConnectionConfig;
pub use error::CoreError;
pub use event::CompletionEvent;
pub use ids::PlayerId;
