//! Weighted-average cost accounting over an execution list
//!
//! Everything here is recomputed from scratch on each call; nothing is
//! carried between calls.

use serde::Serialize;
use std::collections::BTreeMap;
use tracing::warn;

use crate::types::{Execution, Side};

/// Per-symbol accounting summary
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SymbolAnalysis {
    pub symbol: String,
    /// Sum of price * qty over buys
    pub total_cost: f64,
    /// Sum of price * qty over sells
    pub total_revenue: f64,
    pub total_quantity_bought: f64,
    pub total_quantity_sold: f64,
    /// `total_cost / total_quantity_bought`, 0 without buys
    pub avg_buy_price: f64,
    /// `total_revenue - total_quantity_sold * avg_buy_price`, 0 without sells or buys
    pub realized_pnl: f64,
}

impl SymbolAnalysis {
    /// Cost basis of the quantity sold
    pub fn cost_of_sold(&self) -> f64 {
        self.total_quantity_sold * self.avg_buy_price
    }

    /// Realized PNL relative to the cost basis of what was sold, in percent
    pub fn roi_percentage(&self) -> f64 {
        let cost = self.cost_of_sold();
        if cost > 0.0 {
            self.realized_pnl / cost * 100.0
        } else {
            0.0
        }
    }
}

/// Group executions by symbol, keeping their relative order
pub fn group_by_symbol(executions: &[Execution]) -> BTreeMap<String, Vec<Execution>> {
    let mut grouped: BTreeMap<String, Vec<Execution>> = BTreeMap::new();
    for exec in executions {
        grouped
            .entry(exec.symbol.clone())
            .or_default()
            .push(exec.clone());
    }
    grouped
}

/// Accounting summary for one symbol's executions
pub fn analyze_symbol(symbol: &str, executions: &[Execution]) -> SymbolAnalysis {
    let mut analysis = SymbolAnalysis {
        symbol: symbol.to_string(),
        ..Default::default()
    };

    for exec in executions {
        let Some((price, quantity)) = exec.parsed() else {
            warn!(
                "Skipping {} execution with unparsable price/qty: {:?}/{:?}",
                symbol, exec.price, exec.quantity
            );
            continue;
        };

        match exec.side {
            Side::Buy => {
                analysis.total_cost += price * quantity;
                analysis.total_quantity_bought += quantity;
            }
            Side::Sell => {
                analysis.total_revenue += price * quantity;
                analysis.total_quantity_sold += quantity;
            }
        }
    }

    if analysis.total_quantity_bought > 0.0 {
        analysis.avg_buy_price = analysis.total_cost / analysis.total_quantity_bought;
    }

    // selling without any recorded buys has no cost basis; report zero
    if analysis.total_quantity_sold > 0.0 && analysis.total_quantity_bought > 0.0 {
        analysis.realized_pnl = analysis.total_revenue - analysis.cost_of_sold();
    }

    analysis
}

/// Accounting summary for every symbol
pub fn analyze(grouped: &BTreeMap<String, Vec<Execution>>) -> BTreeMap<String, SymbolAnalysis> {
    grouped
        .iter()
        .map(|(symbol, executions)| (symbol.clone(), analyze_symbol(symbol, executions)))
        .collect()
}
