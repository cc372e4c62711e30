/// Signed-in session
///
/// Replaces ambient global session state with an explicit object. A
/// [`Session`] is created at start-up from an identity provider, follows its
/// sign-in notifications, and tells the TaskHub service who is signed in.
/// Signing out clears the balance cache.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use taskhub_client::api::{HttpTaskHubApi, TaskHubApi};
/// use taskhub_client::config::ClientConfig;
/// use taskhub_client::providers::MockIdentityProvider;
/// use taskhub_client::session::Session;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = ClientConfig::from_env()?;
/// let api: Arc<dyn TaskHubApi> = Arc::new(HttpTaskHubApi::new(config.api)?);
/// let identities = MockIdentityProvider::new();
///
/// let session = Session::start(api, &identities);
/// if let Some(identity) = session.identity().await {
///     println!("Signed in as {}", identity.email);
/// }
/// # Ok(())
/// # }
/// ```

use crate::api::TaskHubApi;
use crate::cache::BalanceCache;
use crate::error::{ClientError, ClientResult};
use crate::providers::{Identity, IdentityProvider};
use std::sync::{Arc, Mutex, Weak};
use taskhub_shared::models::{Role, User};
use tokio::sync::{watch, Mutex as AsyncMutex, RwLock};
use tokio::task::JoinHandle;

type IdentityUpdates = watch::Receiver<Option<Identity>>;

/// Session context shared by the marketplace flows
pub struct Session {
    api: Arc<dyn TaskHubApi>,
    identity: RwLock<Option<Identity>>,
    cache: BalanceCache,
    /// Provider state; locked while an update is applied so updates never
    /// land out of order
    updates: AsyncMutex<IdentityUpdates>,
    follower: Mutex<Option<JoinHandle<()>>>,
}

impl Session {
    /// Creates a session and follows `provider`'s sign-in state.
    ///
    /// Must be called inside a tokio runtime.
    pub fn start(api: Arc<dyn TaskHubApi>, provider: &dyn IdentityProvider) -> Arc<Self> {
        let session = Arc::new(Self {
            api,
            identity: RwLock::new(None),
            cache: BalanceCache::new(),
            updates: AsyncMutex::new(provider.subscribe()),
            follower: Mutex::new(None),
        });
        let mut wake = provider.subscribe();
        let weak: Weak<Session> = Arc::downgrade(&session);

        let handle = tokio::spawn(async move {
            while wake.changed().await.is_ok() {
                let Some(session) = weak.upgrade() else {
                    break;
                };
                if let Err(e) = session.sync().await {
                    tracing::warn!(error = %e, "Failed to sync server session");
                }
            }
            tracing::debug!("Identity follower stopped");
        });

        if let Ok(mut follower) = session.follower.lock() {
            *follower = Some(handle);
        }
        session
    }

    /// Applies the provider's latest sign-in state
    pub async fn sync(&self) -> ClientResult<()> {
        let mut rx = self.updates.lock().await;
        let latest = rx.borrow_and_update().clone();
        self.set_identity(latest).await
    }

    /// Switches the signed-in identity.
    ///
    /// Opens a server session for a new identity; on sign-out clears the
    /// cache and closes the server session. Repeated notifications for the
    /// same email are ignored.
    pub async fn set_identity(&self, next: Option<Identity>) -> ClientResult<()> {
        let previous = {
            let mut guard = self.identity.write().await;
            std::mem::replace(&mut *guard, next.clone())
        };

        let previous_email = previous.as_ref().map(|i| i.email.as_str());
        let next_email = next.as_ref().map(|i| i.email.as_str());
        if previous_email == next_email {
            return Ok(());
        }

        match next {
            Some(identity) => {
                tracing::info!(email = %identity.email, "Signed in");
                self.cache.clear().await;
                self.api.open_session(&identity.email).await
            }
            None => {
                tracing::info!("Signed out");
                self.cache.clear().await;
                self.api.close_session().await
            }
        }
    }

    pub async fn identity(&self) -> Option<Identity> {
        self.identity.read().await.clone()
    }

    /// Current identity or `NotAuthenticated`
    pub async fn require_identity(&self) -> ClientResult<Identity> {
        self.identity().await.ok_or(ClientError::NotAuthenticated)
    }

    /// Fetches the signed-in user and checks the role.
    ///
    /// The fetch doubles as the fresh balance read, so the cache is updated.
    pub async fn require_role(&self, role: Role) -> ClientResult<User> {
        self.require_user(|r| r == role, &format!("only a {} can do this", role))
            .await
    }

    /// Fetches the signed-in user and checks `allowed` against the role
    pub async fn require_user(
        &self,
        allowed: impl Fn(Role) -> bool,
        denial: &str,
    ) -> ClientResult<User> {
        let identity = self.require_identity().await?;
        let user = self.api.fetch_user(&identity.email).await?;
        self.cache.record(&user.email, user.balance).await;

        if !allowed(user.role) {
            tracing::warn!(email = %user.email, role = %user.role, "Action not allowed for role");
            return Err(ClientError::Forbidden(denial.to_string()));
        }
        Ok(user)
    }

    pub fn cache(&self) -> &BalanceCache {
        &self.cache
    }

    /// Signs out locally and stops following the provider
    pub async fn end(&self) -> ClientResult<()> {
        if let Ok(mut follower) = self.follower.lock() {
            if let Some(handle) = follower.take() {
                handle.abort();
            }
        }
        self.set_identity(None).await
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Ok(mut follower) = self.follower.lock() {
            if let Some(handle) = follower.take() {
                handle.abort();
            }
        }
    }
}
