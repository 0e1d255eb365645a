pub mod date_serde;
pub mod language;
pub mod lenient;
pub mod lexicon;
pub mod segment;
pub mod task;

pub use task::{DueBucket, Priority, StatusCategory, TaskRecord};
