//! Office dataset loading.
//!
//! Reads the office CSV (optionally gzip-compressed), coerces the coordinate
//! and district columns and memoizes parsed point sets by file content.

mod loader;

pub use loader::{parse_points, DatasetLoader, LATITUDE, LONGITUDE, DISTRICT};
