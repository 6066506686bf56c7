//! # extcore-core
//!
//! Core crate for ExtCore. Contains the unified error system and the
//! configuration schemas shared by the infrastructure, the extension
//! crates and the hosts.
//!
//! This crate has **no** internal dependencies on other ExtCore crates.

pub mod config;
pub mod error;
pub mod result;

pub use error::{AppError, ErrorKind};
pub use result::AppResult;
