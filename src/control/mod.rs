//! Control algorithms.

pub mod pump;
