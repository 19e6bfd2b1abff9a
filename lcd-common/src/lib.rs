//! # LCD Common Library
//!
//! Shared code for the legislative candidate discovery crates:
//! - District identifiers and district scope
//! - Configuration file resolution and TOML loading
//! - Logging bootstrap
//! - Common error type

pub mod config;
pub mod district;
pub mod error;
pub mod logging;

pub use district::{Chamber, DistrictId, DistrictScope};
pub use error::{Error, Result};
