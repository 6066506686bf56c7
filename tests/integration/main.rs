//! Integration tests for the ExtCore host lifecycle.

mod helpers;

mod catalog_test;
mod discovery_test;
mod lifecycle_test;
