//! Background file loading.

mod loader;

pub use loader::{load_file_worker, LoadRequest};
