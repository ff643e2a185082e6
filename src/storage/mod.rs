//! Persistence between runs: only the GUID of the newest processed entry.

mod marker;

pub use marker::{MarkerError, MarkerStore};
