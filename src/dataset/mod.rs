//! Photo table input and the clustered-records output

pub mod loader;
pub mod writer;

pub use loader::{load_records, presample, LoadedRecords};
pub use writer::write_clustered_records;
