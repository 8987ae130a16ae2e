pub mod common;
pub mod config;
pub mod engine;
pub mod market;
pub mod trade;

#[cfg(feature = "test-utils")]
pub mod test_utils;
