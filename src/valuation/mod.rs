//! Stock valuation: market quotations plus operator overrides

pub mod formula;
pub mod index;

pub use index::{
    build_index, load_price_snapshot, OverridePrice, PriceEntry, PriceIndex, PriceOverride,
};
