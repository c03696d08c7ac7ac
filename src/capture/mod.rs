pub mod classifier;
pub mod dedup;

pub use classifier::Classifier;
pub use dedup::DedupFilter;
