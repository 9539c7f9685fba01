//! Drive control policy.

pub mod policy;
