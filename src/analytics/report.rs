//! Plain-text and CSV renderings of the analytics

use std::collections::BTreeMap;
use std::fmt::Write as _;

use super::cost_basis::SymbolAnalysis;
use super::display::DisplayAsset;

/// Realized PNL table, largest absolute PNL first
pub fn realized_report(analysis: &BTreeMap<String, SymbolAnalysis>) -> String {
    if analysis.is_empty() {
        return "No trade history found.".to_string();
    }

    let mut rows: Vec<&SymbolAnalysis> = analysis.values().collect();
    rows.sort_by(|a, b| b.realized_pnl.abs().total_cmp(&a.realized_pnl.abs()));

    let mut out = String::new();
    let _ = writeln!(out, "Realized PnL report");
    let _ = writeln!(out);
    let _ = writeln!(out, "{:<12} | {:>12} | {:>8}", "Asset", "PnL ($)", "ROI (%)");
    let _ = writeln!(out, "{}", "-".repeat(38));

    let mut total = 0.0;
    for row in rows {
        total += row.realized_pnl;
        let _ = writeln!(
            out,
            "{:<12} | {:>12.2} | {:>8.2}",
            row.symbol,
            row.realized_pnl,
            row.roi_percentage()
        );
    }

    let _ = writeln!(out);
    let _ = write!(out, "Total: {:.2}$", total);
    out
}

/// Held assets with value and unrealized PNL, plus coins without a price
pub fn balance_report(assets: &[DisplayAsset], missing_prices: &[String]) -> String {
    if assets.iter().all(|a| a.quantity == 0.0) {
        return "Portfolio is empty.".to_string();
    }

    let mut out = String::new();
    let _ = writeln!(out, "Spot portfolio");
    let _ = writeln!(out);
    let _ = writeln!(out, "{:<8} | {:>14} | {}", "Asset", "Quantity", "PnL $ (%)");
    let _ = writeln!(out, "{}", "-".repeat(39));

    let mut total_value = 0.0;
    let mut total_pnl = 0.0;
    for asset in assets.iter().filter(|a| a.quantity != 0.0) {
        total_value += asset.current_value;
        total_pnl += asset.unrealized_pnl;
        let _ = writeln!(
            out,
            "{:<8} | {:>14.4} | {:.2} ({:.1}%)",
            asset.name, asset.quantity, asset.unrealized_pnl, asset.pnl_percentage
        );
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "Total value: {:.2}$", total_value);
    let _ = write!(out, "Total PnL: {:.2}$", total_pnl);

    if !missing_prices.is_empty() {
        let _ = write!(out, "\n\nNo price found for: {}", missing_prices.join(", "));
    }
    out
}

/// CSV export of the per-symbol accounting
pub fn export_csv(analysis: &BTreeMap<String, SymbolAnalysis>) -> Result<Vec<u8>, csv::Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "Symbol",
        "Realized PNL",
        "Total Spent",
        "Total Received",
        "Avg Buy Price",
        "Bought",
        "Sold",
    ])?;

    for row in analysis.values() {
        writer.write_record([
            row.symbol.clone(),
            format!("{:.2}", row.realized_pnl),
            format!("{:.2}", row.total_cost),
            format!("{:.2}", row.total_revenue),
            format!("{:.2}", row.avg_buy_price),
            format!("{:.4}", row.total_quantity_bought),
            format!("{:.4}", row.total_quantity_sold),
        ])?;
    }

    writer.into_inner().map_err(|e| e.into_error().into())
}
