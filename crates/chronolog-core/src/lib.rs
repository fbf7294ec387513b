pub mod entry;
pub mod error;
pub mod offsets;

pub use entry::Entry;
pub use error::{Error, Result};
