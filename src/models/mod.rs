pub mod asin;
pub mod filter;
pub mod row;
pub mod stats;

pub use asin::*;
pub use filter::*;
pub use row::*;
pub use stats::*;
