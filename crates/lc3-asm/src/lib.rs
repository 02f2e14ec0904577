pub mod listing;

// Re-export commonly used types/functions for consumers
pub use listing::{build_listing, load_source, symbol_rows, LabelKV, Listing, Row};
