pub mod adapter;
pub mod broadcast;
pub mod error;
pub mod ledger;

pub use adapter::{EventAdapter, Outcome};
pub use broadcast::{announcement, Broadcaster, LogBroadcaster};
pub use error::EngineError;
pub use ledger::Ledger;
