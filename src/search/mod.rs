pub mod matcher;

// Re-export common helpers
pub use matcher::{filter_by_query, match_labels};
