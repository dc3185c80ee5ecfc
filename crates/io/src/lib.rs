// File I/O for record collections

pub mod error;
pub mod json;

pub use error::IoError;
pub use json::{load_records, write_records};
