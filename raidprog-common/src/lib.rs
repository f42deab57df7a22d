//! # RaidProg Common Library
//!
//! Shared code for the RaidProg crates:
//! - Error and result types
//! - Bootstrap configuration loading
//! - Public identifier generation

pub mod config;
pub mod error;
pub mod public_id;

pub use error::{Error, Result};
