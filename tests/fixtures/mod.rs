//! Test fixtures for hawker-route.
//!
//! Real Singapore hawker centre coordinates (from OpenStreetMap) used as
//! buyer and hawker positions in the realistic routing tests.

pub mod singapore_locations;

pub use singapore_locations::*;
