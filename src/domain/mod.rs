pub mod payload;
pub mod types;

pub use payload::{PageContext, Payload};
pub use types::{
    CaptureCandidate, Classification, ColorHint, ConnectionStatus, Detection, QueueSnapshot,
    SourceTag,
};
