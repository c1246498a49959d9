//! Domain models for the market data crate.
//!
//! - [`AssetRecord`] - Normalized per-asset market data row

mod asset;

pub use asset::AssetRecord;
