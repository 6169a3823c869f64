//! CLI command implementations.
//!
//! Each command writes its result to the given writer so it can be tested
//! without capturing stdout.

pub mod cart;
pub mod checkout;
pub mod zones;
