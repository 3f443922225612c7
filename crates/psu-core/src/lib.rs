//! Survey variable extraction and per-PSU spatial feature sampling for
//! Afrobarometer Round 8 countries.

pub mod config;
pub mod coords;
pub mod country;
pub mod error;
pub mod geometry;
pub mod grid;
pub mod raster;
pub mod spatial;
pub mod survey;

pub use error::{PsuError, Result};
