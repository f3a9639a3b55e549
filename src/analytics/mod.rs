//! Cost-basis analytics
//!
//! Pure functions over an already-fetched execution list:
//! - [`cost_basis`] - grouping and weighted-average accounting per symbol
//! - [`display`] - join with live balances and prices for unrealized PNL
//! - [`report`] - text tables and CSV export

pub mod cost_basis;
pub mod display;
pub mod report;

pub use cost_basis::{analyze, analyze_symbol, group_by_symbol, SymbolAnalysis};
pub use display::{held_symbols, symbol_for, to_display_assets, DisplayAsset};
pub use report::{balance_report, export_csv, realized_report};
