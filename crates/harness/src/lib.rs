pub mod host;
pub mod recorder;

pub use host::{TestHost, Tables};
pub use recorder::RecordingBroadcaster;
