//! Cloudflare R2 (S3-compatible) backend.
//!
//! The boundary is [`BucketApi`]: metadata-only HEAD, conditional PUT
//! and DELETE in the S3 shape. [`S3BucketClient`] adapts a
//! caller-constructed [`aws_sdk_s3::Client`]; [`R2Store`] runs the
//! content-addressed upload sequence on top.

pub mod client;
pub mod store;

pub use client::{BucketApi, ObjectHead, PutParams, S3BucketClient};
pub use store::R2Store;
