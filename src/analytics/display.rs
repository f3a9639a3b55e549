//! Join of cost basis with live balances and prices

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use super::cost_basis::SymbolAnalysis;

/// Quote currency every held coin is priced against
pub const QUOTE_ASSET: &str = "USDT";

/// Pegged assets that carry no meaningful PNL
pub const STABLE_COINS: [&str; 3] = ["USDT", "USDC", "DAI"];

/// One held coin with its valuation and unrealized PNL
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DisplayAsset {
    /// Coin name, e.g. "BTC"
    pub name: String,
    /// Trading symbol, e.g. "BTCUSDT"
    pub symbol: String,
    /// Held quantity
    pub quantity: f64,
    /// Last traded price, 0 when unknown
    pub current_price: f64,
    /// quantity * current_price
    pub current_value: f64,
    /// Weighted-average buy price, 0 when there is no buy history
    pub avg_buy_price: f64,
    pub unrealized_pnl: f64,
    pub pnl_percentage: f64,
}

/// Trading symbol for a coin, e.g. "BTC" -> "BTCUSDT"
pub fn symbol_for(coin: &str) -> String {
    format!("{}{}", coin, QUOTE_ASSET)
}

pub fn is_stable_coin(coin: &str) -> bool {
    STABLE_COINS.contains(&coin)
}

/// Symbols of held, non-stable coins: the ones that need a cost basis and a price
pub fn held_symbols(balances: &BTreeMap<String, f64>) -> Vec<String> {
    balances
        .iter()
        .filter(|(coin, quantity)| !is_stable_coin(coin) && **quantity > 0.0)
        .map(|(coin, _)| symbol_for(coin))
        .collect()
}

/// Build display rows for every held, non-stable coin.
///
/// Unrealized PNL is only computed when both the average buy price and the
/// current price are known; otherwise it stays 0.
pub fn to_display_assets(
    analysis: &BTreeMap<String, SymbolAnalysis>,
    balances: &BTreeMap<String, f64>,
    prices: &HashMap<String, f64>,
) -> Vec<DisplayAsset> {
    let mut assets = Vec::new();

    for (coin, &quantity) in balances {
        if is_stable_coin(coin) || quantity == 0.0 {
            continue;
        }

        let symbol = symbol_for(coin);
        let mut asset = DisplayAsset {
            name: coin.clone(),
            symbol: symbol.clone(),
            quantity,
            ..Default::default()
        };

        if let Some(analysis) = analysis.get(&symbol) {
            asset.avg_buy_price = analysis.avg_buy_price;
        }
        if let Some(&price) = prices.get(&symbol) {
            asset.current_price = price;
        }

        if asset.current_price > 0.0 {
            asset.current_value = asset.quantity * asset.current_price;
        }

        if asset.avg_buy_price > 0.0 && asset.current_price > 0.0 {
            asset.unrealized_pnl = (asset.current_price - asset.avg_buy_price) * asset.quantity;
            let basis = asset.avg_buy_price * asset.quantity;
            if basis != 0.0 {
                asset.pnl_percentage = asset.unrealized_pnl / basis * 100.0;
            }
        }

        assets.push(asset);
    }

    assets
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analysis(symbol: &str, avg_buy_price: f64) -> (String, SymbolAnalysis) {
        (
            symbol.to_string(),
            SymbolAnalysis {
                symbol: symbol.to_string(),
                avg_buy_price,
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_unrealized_pnl() {
        let analysis: BTreeMap<_, _> = [analysis("BTCUSDT", 50_000.0)].into_iter().collect();
        let balances: BTreeMap<_, _> = [("BTC".to_string(), 0.5)].into_iter().collect();
        let prices: HashMap<_, _> = [("BTCUSDT".to_string(), 60_000.0)].into_iter().collect();

        let assets = to_display_assets(&analysis, &balances, &prices);

        assert_eq!(assets.len(), 1);
        let btc = &assets[0];
        assert_eq!(btc.name, "BTC");
        assert_eq!(btc.symbol, "BTCUSDT");
        assert!((btc.current_value - 30_000.0).abs() < 1e-9);
        assert!((btc.unrealized_pnl - 5_000.0).abs() < 1e-9);
        assert!((btc.pnl_percentage - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_skips_stable_coins_and_zero_balances() {
        let balances: BTreeMap<_, _> = [
            ("USDT".to_string(), 1_000.0),
            ("USDC".to_string(), 10.0),
            ("DAI".to_string(), 5.0),
            ("ETH".to_string(), 0.0),
            ("SOL".to_string(), 3.0),
        ]
        .into_iter()
        .collect();

        let assets = to_display_assets(&BTreeMap::new(), &balances, &HashMap::new());

        assert_eq!(assets.len(), 1);
        assert_eq!(assets[0].name, "SOL");
        assert_eq!(held_symbols(&balances), vec!["SOLUSDT".to_string()]);
    }

    #[test]
    fn test_missing_cost_basis_or_price_leaves_pnl_zero() {
        let analysis: BTreeMap<_, _> = [analysis("ETHUSDT", 2_000.0)].into_iter().collect();
        let balances: BTreeMap<_, _> = [("ETH".to_string(), 2.0), ("XRP".to_string(), 100.0)]
            .into_iter()
            .collect();
        let prices: HashMap<_, _> = [("XRPUSDT".to_string(), 0.5)].into_iter().collect();

        let assets = to_display_assets(&analysis, &balances, &prices);

        let eth = assets.iter().find(|a| a.name == "ETH").unwrap();
        assert_eq!(eth.current_price, 0.0);
        assert_eq!(eth.current_value, 0.0);
        assert_eq!(eth.unrealized_pnl, 0.0);
        assert_eq!(eth.pnl_percentage, 0.0);

        let xrp = assets.iter().find(|a| a.name == "XRP").unwrap();
        assert!((xrp.current_value - 50.0).abs() < 1e-9);
        assert_eq!(xrp.unrealized_pnl, 0.0);
        assert!(!xrp.pnl_percentage.is_nan());
    }
}
