#![forbid(unsafe_code)]

pub mod aggregation;
pub mod config;
pub mod datamodel;
pub mod error;
pub mod exporters;
pub mod parsing;
pub mod pipeline;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
