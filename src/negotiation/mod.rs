//! Negotiation window sessions: offer valuation, purchase and reroll

pub mod policy;
pub mod session;
pub mod types;

pub use policy::{PurchasePolicy, ThresholdPolicy};
pub use session::NegotiationSession;
pub use types::{ItemState, NegotiationItem};
