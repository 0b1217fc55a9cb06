//! Sensor sources
//!
//! Depth-camera drivers live outside this crate; [`SyntheticDepthCamera`]
//! stands in for one during development and tests.

pub mod synthetic_depth;

pub use synthetic_depth::SyntheticDepthCamera;
