//! Format extractors: raw document bytes in, per-period fuel totals out.

pub mod delimited;
pub mod jsonstat;
pub mod pdf;
pub mod spreadsheet;
pub mod tokens;

pub use delimited::DelimitedLayout;
pub use jsonstat::Dataset;
pub use pdf::{CountryRowQuery, SlotPolicy};
pub use spreadsheet::SheetMode;
