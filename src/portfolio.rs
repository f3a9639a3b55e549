//! End-to-end flows consumed by reports: history sync joined with live data

use std::collections::BTreeMap;
use tracing::{info, warn};

use crate::analytics::{analyze, group_by_symbol, held_symbols, to_display_assets, DisplayAsset, SymbolAnalysis};
use crate::bybit::BybitClient;
use crate::cache::{TradeCache, TradeSync};
use crate::error::ApiError;

/// Current holdings with cost basis and unrealized PNL
#[derive(Debug, Clone, Default)]
pub struct BalanceView {
    pub assets: Vec<DisplayAsset>,
    /// Coins for which no price could be found
    pub missing_prices: Vec<String>,
    /// Account-wide wallet balance reported by the exchange
    pub total_wallet_balance: Option<f64>,
}

/// Per-symbol realized accounting for a user's full cached history
pub async fn load_analysis<C: TradeCache + 'static>(
    client: &BybitClient,
    sync: &TradeSync<C>,
    user_id: i64,
) -> Result<BTreeMap<String, SymbolAnalysis>, ApiError> {
    let executions = sync.get_trades_with_cache(client, user_id).await?;
    Ok(analyze(&group_by_symbol(&executions)))
}

/// Holdings view: synced history, balance snapshot and prices joined together.
///
/// Coins missing from the bulk ticker list get a single-symbol price lookup
/// before being reported as missing.
pub async fn load_balance_view<C: TradeCache + 'static>(
    client: &BybitClient,
    sync: &TradeSync<C>,
    user_id: i64,
) -> Result<BalanceView, ApiError> {
    let analysis = load_analysis(client, sync, user_id).await?;
    let balance = client.spot_balance().await?;
    let mut prices = client.market_prices().await?;

    for symbol in held_symbols(&balance.coins) {
        if prices.get(&symbol).is_some_and(|price| *price > 0.0) {
            continue;
        }
        info!("[Balance] {} not in ticker list, trying single lookup", symbol);
        match client.current_price(&symbol).await {
            Ok(price) => {
                prices.insert(symbol, price);
            }
            Err(err) => warn!("[Balance] No price for {}: {}", symbol, err),
        }
    }

    let assets = to_display_assets(&analysis, &balance.coins, &prices);
    let missing_prices = assets
        .iter()
        .filter(|asset| asset.current_price == 0.0)
        .map(|asset| asset.name.clone())
        .collect();

    info!("[Balance] User {}: {} assets processed", user_id, assets.len());
    Ok(BalanceView {
        assets,
        missing_prices,
        total_wallet_balance: balance.total,
    })
}
