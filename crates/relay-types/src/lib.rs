//! Value types shared across the relay: orders, asset data, signatures and
//! the wire-level API envelopes.

pub mod api;
pub mod asset_data;
pub mod common;
pub mod order;
pub mod signature;

pub use api::*;
pub use asset_data::*;
pub use common::*;
pub use order::*;
pub use signature::*;
