//! agent可调用的工具

pub mod delegate;
pub mod search;
pub mod website;
