pub mod connection;
pub mod courier;
pub mod monitor;
pub mod queue;
pub mod transport;

pub use connection::{ConnectionState, ProbeVerdict};
pub use courier::{Courier, DeliveryOutcome, FlushReport};
pub use monitor::ConnectionMonitor;
pub use queue::{DeliveryQueue, EnqueueOutcome};
pub use transport::{DeliveryError, HttpTransport, ServiceStatus, Transport};
