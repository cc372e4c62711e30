/// Read-through balance cache
///
/// Holds, per email, the last balance the server confirmed and the balance
/// currently shown. Flows move an entry through:
///
/// ```text
/// refresh → apply_optimistic → confirm   (remote write succeeded)
///                            → rollback  (remote write failed)
/// ```
///
/// Entries are marked stale after every mutation so the next
/// [`BalanceCache::read_through`] goes back to the server.
///
/// # Example
///
/// ```
/// use taskhub_client::cache::BalanceCache;
/// use taskhub_shared::Coins;
///
/// # async fn example() {
/// let cache = BalanceCache::new();
/// cache.record("b@example.com", Coins::whole(50)).await;
/// cache.apply_optimistic("b@example.com", Coins::whole(30)).await;
/// assert_eq!(cache.displayed("b@example.com").await, Some(Coins::whole(30)));
///
/// cache.rollback("b@example.com").await;
/// assert_eq!(cache.displayed("b@example.com").await, Some(Coins::whole(50)));
/// # }
/// ```

use crate::api::TaskHubApi;
use crate::error::ClientResult;
use std::collections::HashMap;
use std::sync::Arc;
use taskhub_shared::Coins;
use tokio::sync::RwLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Entry {
    confirmed: Coins,
    displayed: Coins,
    stale: bool,
}

impl Entry {
    fn fresh(balance: Coins) -> Self {
        Self {
            confirmed: balance,
            displayed: balance,
            stale: false,
        }
    }
}

/// Shared balance cache
#[derive(Debug, Clone, Default)]
pub struct BalanceCache {
    entries: Arc<RwLock<HashMap<String, Entry>>>,
}

impl BalanceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetches the balance from the server and stores it as confirmed
    pub async fn refresh(&self, api: &dyn TaskHubApi, email: &str) -> ClientResult<Coins> {
        let user = api.fetch_user(email).await?;
        self.record(email, user.balance).await;
        Ok(user.balance)
    }

    /// Cached balance when fresh, otherwise a server read
    pub async fn read_through(&self, api: &dyn TaskHubApi, email: &str) -> ClientResult<Coins> {
        if let Some(entry) = self.entries.read().await.get(email) {
            if !entry.stale {
                return Ok(entry.displayed);
            }
        }
        self.refresh(api, email).await
    }

    /// Stores a server-confirmed balance
    pub async fn record(&self, email: &str, balance: Coins) {
        self.entries
            .write()
            .await
            .insert(email.to_string(), Entry::fresh(balance));
    }

    /// Shows `balance` ahead of the remote write
    pub async fn apply_optimistic(&self, email: &str, balance: Coins) {
        let mut entries = self.entries.write().await;
        entries
            .entry(email.to_string())
            .and_modify(|e| e.displayed = balance)
            .or_insert(Entry {
                // Unknown confirmed value; force a re-read later
                confirmed: balance,
                displayed: balance,
                stale: true,
            });
    }

    /// Remote write succeeded; `balance` becomes the confirmed value
    pub async fn confirm(&self, email: &str, balance: Coins) {
        self.entries.write().await.insert(
            email.to_string(),
            Entry {
                confirmed: balance,
                displayed: balance,
                stale: true,
            },
        );
    }

    /// Remote write failed; restores the last confirmed value
    pub async fn rollback(&self, email: &str) -> Option<Coins> {
        let mut entries = self.entries.write().await;
        let entry = entries.get_mut(email)?;
        entry.displayed = entry.confirmed;
        entry.stale = true;
        tracing::debug!(%email, balance = %entry.confirmed, "Balance rolled back");
        Some(entry.confirmed)
    }

    /// Forces the next read to go to the server
    pub async fn invalidate(&self, email: &str) {
        if let Some(entry) = self.entries.write().await.get_mut(email) {
            entry.stale = true;
        }
    }

    /// Drops everything, on sign-out
    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    /// Balance currently shown for `email`
    pub async fn displayed(&self, email: &str) -> Option<Coins> {
        self.entries.read().await.get(email).map(|e| e.displayed)
    }
}
