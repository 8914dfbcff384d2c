//! Domain models for the stockroom ledger.

mod history;
mod product;

pub use history::*;
pub use product::*;
