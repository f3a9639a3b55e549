use serde::{Deserialize, Serialize};

/// Trade direction of a single fill
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buy => write!(f, "Buy"),
            Self::Sell => write!(f, "Sell"),
        }
    }
}

/// One executed fill as reported by `/v5/execution/list`.
///
/// Price and quantity are kept as the exchange's decimal strings so the
/// cached JSON matches the wire format exactly; accounting parses them on demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Execution {
    pub symbol: String,
    #[serde(rename = "execPrice")]
    pub price: String,
    #[serde(rename = "execQty")]
    pub quantity: String,
    pub side: Side,
}

impl Execution {
    pub fn new(symbol: &str, price: &str, quantity: &str, side: Side) -> Self {
        Self {
            symbol: symbol.to_string(),
            price: price.to_string(),
            quantity: quantity.to_string(),
            side,
        }
    }

    /// Parsed `(price, quantity)`, or `None` if either field is not a number
    pub fn parsed(&self) -> Option<(f64, f64)> {
        let price = self.price.trim().parse::<f64>().ok()?;
        let quantity = self.quantity.trim().parse::<f64>().ok()?;
        if price.is_finite() && quantity.is_finite() {
            Some((price, quantity))
        } else {
            None
        }
    }
}

/// Free balance snapshot for a spot account
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BalanceSnapshot {
    /// Account-wide wallet balance in USD, when the exchange reports one
    pub total: Option<f64>,
    /// Coin -> held quantity
    pub coins: std::collections::BTreeMap<String, f64>,
}
