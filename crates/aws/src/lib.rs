//! S3-compatible content store for burnbin.
//!
//! Works against AWS S3 and against MinIO or other S3-compatible servers via
//! an endpoint override with path-style addressing.

pub mod auth;
pub mod config;
pub mod error;
pub mod s3;

pub use config::AwsBaseConfig;
pub use s3::{S3Config, S3ContentStore};
