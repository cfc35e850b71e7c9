pub mod listing;
pub mod summary;

pub use listing::{is_allowed_trade_type, NormalizedListing, ALLOWED_TRADE_TYPES};
pub use summary::{summary_sheet_values, SummaryRow, SUMMARY_SHEET_HEADER};
