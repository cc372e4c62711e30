/// Coin packages, purchases and withdrawals

use crate::money::{Coins, Usd};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Purchasable bundle of coins
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinPackage {
    pub coins: Coins,
    pub price: Usd,
    pub label: String,
}

impl CoinPackage {
    pub fn new(coins: i64, price: i64, label: &str) -> Self {
        Self {
            coins: Coins::whole(coins),
            price: Usd::whole(price),
            label: label.to_string(),
        }
    }

    /// Packages offered in the store
    pub fn catalogue() -> Vec<CoinPackage> {
        vec![
            CoinPackage::new(10, 1, "Starter Pack"),
            CoinPackage::new(150, 10, "Bronze Pack"),
            CoinPackage::new(500, 20, "Silver Pack"),
            CoinPackage::new(1000, 35, "Gold Pack"),
        ]
    }

    /// Looks a package up by label, case-insensitive; "gold" matches "Gold Pack"
    pub fn find(name: &str) -> Option<CoinPackage> {
        let needle = name.trim().to_ascii_lowercase();
        Self::catalogue().into_iter().find(|p| {
            let label = p.label.to_ascii_lowercase();
            label == needle || label.trim_end_matches(" pack") == needle
        })
    }
}

/// Stored checkout record (payment history row)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRecord {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub price: Usd,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coins: Option<Coins>,

    #[serde(default = "default_currency")]
    pub currency: String,

    pub email: String,

    #[serde(rename = "userId", default)]
    pub user_id: String,

    #[serde(rename = "paymentMethodId", default, skip_serializing_if = "Option::is_none")]
    pub payment_method_id: Option<String>,

    #[serde(rename = "createdat")]
    pub created_at: DateTime<Utc>,
}

fn default_currency() -> String {
    "usd".to_string()
}

/// Quoted withdrawal: coins debited and dollars paid out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalQuote {
    #[serde(rename = "coinToWithdraw")]
    pub coin_to_withdraw: Coins,

    #[serde(rename = "withdrawAmount")]
    pub withdraw_amount: Usd,
}
