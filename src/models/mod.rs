//! Core data models for the office tessellation.

pub mod office;
pub mod region;

pub use office::{DistrictCode, OfficePoint, PointId, PointSet};
pub use region::{Region, RegionShape};
