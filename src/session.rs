//! Session: the current user, sign/unsign and third-party login
//!
//! Login happens in a provider popup. Instead of a global callback the popup
//! completion handler is given a [`LoginCompletion`]; firing it resolves the
//! matching [`PendingLogin`], after which the session reloads the user.

use crate::api::{ManifestoApi, User};
use crate::error::{FeedError, Result};
use crate::feed::FeedHandle;
use crate::transport::Transport;
use std::fmt;
use std::str::FromStr;
use tokio::sync::{oneshot, watch};
use tracing::{debug, info, warn};

/// Window name shared by all login popups, so a second click reuses the window
pub const LOGIN_WINDOW_NAME: &str = "reactivemanifestologin";
pub const LOGIN_WINDOW_WIDTH: u32 = 1024;
pub const LOGIN_WINDOW_HEIGHT: u32 = 640;

/// Third-party login provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    Twitter,
    GitHub,
    Google,
    LinkedIn,
}

impl Provider {
    pub const ALL: [Provider; 4] = [
        Provider::Twitter,
        Provider::GitHub,
        Provider::Google,
        Provider::LinkedIn,
    ];

    /// Path segment used by the auth endpoint
    pub fn slug(self) -> &'static str {
        match self {
            Provider::Twitter => "twitter",
            Provider::GitHub => "github",
            Provider::Google => "google",
            Provider::LinkedIn => "linkedin",
        }
    }

    /// Path that starts the OAuth dance
    pub fn auth_path(self) -> String {
        format!("/{}/auth", self.slug())
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for Provider {
    type Err = FeedError;

    fn from_str(s: &str) -> Result<Self> {
        Provider::ALL
            .into_iter()
            .find(|p| p.slug().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| FeedError::Config(format!("unknown login provider: {}", s)))
    }
}

/// How the shell should open the login popup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopupSpec {
    pub url: String,
    pub window_name: &'static str,
    pub width: u32,
    pub height: u32,
}

/// Given to the popup completion handler
#[derive(Debug)]
pub struct LoginCompletion {
    provider: Provider,
    done: oneshot::Sender<()>,
}

impl LoginCompletion {
    /// Report that the provider redirected back successfully
    pub fn complete(self) {
        debug!("Login popup for {} completed", self.provider);
        let _ = self.done.send(());
    }
}

/// A login waiting on its popup
#[derive(Debug)]
pub struct PendingLogin {
    pub provider: Provider,
    pub popup: PopupSpec,
    done: oneshot::Receiver<()>,
}

/// Observable session state
#[derive(Debug, Clone, Default)]
pub struct SessionSnapshot {
    pub user: Option<User>,
    /// The provider chooser is showing
    pub signing: bool,
    pub last_error: Option<String>,
}

impl SessionSnapshot {
    pub fn is_logged_in(&self) -> bool {
        self.user.is_some()
    }
}

/// Issues session calls and keeps the current user observable
pub struct SessionController<T> {
    api: ManifestoApi<T>,
    feed: FeedHandle,
    state: watch::Sender<SessionSnapshot>,
}

impl<T: Transport> SessionController<T> {
    /// Sign and unsign refresh the total and roster through `feed`
    pub fn new(api: ManifestoApi<T>, feed: FeedHandle) -> Self {
        let (state, _) = watch::channel(SessionSnapshot::default());
        Self { api, feed, state }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.state.subscribe()
    }

    /// Show the provider chooser
    pub fn begin_signing(&self) {
        self.state.send_modify(|s| s.signing = true);
    }

    /// Hide the provider chooser
    pub fn cancel_signing(&self) {
        self.state.send_modify(|s| s.signing = false);
    }

    /// Reload the current user from the server
    pub async fn refresh_user(&self) -> Result<Option<User>> {
        let user = self.track(self.api.current_user().await)?;
        self.set_user(user.clone());
        Ok(user)
    }

    /// Sign, then refresh the total and the default roster
    pub async fn sign(&self) -> Result<Option<User>> {
        let user = self.track(self.api.sign().await)?;
        info!("Signed as {}", describe(user.as_ref()));
        self.after_signature_change(user).await
    }

    /// Withdraw the signature, then refresh the total and the default roster
    pub async fn unsign(&self) -> Result<Option<User>> {
        let user = self.track(self.api.unsign().await)?;
        info!("Signature withdrawn for {}", describe(user.as_ref()));
        self.after_signature_change(user).await
    }

    /// End the session and forget the user
    pub async fn logout(&self) -> Result<()> {
        self.track(self.api.logout().await)?;
        self.set_user(None);
        Ok(())
    }

    /// Start a login with `provider`.
    ///
    /// Open `pending.popup` and hand the [`LoginCompletion`] to whatever
    /// observes the popup finishing, then await [`Self::finish_login`].
    pub fn login(&self, provider: Provider) -> (PendingLogin, LoginCompletion) {
        let (done_tx, done_rx) = oneshot::channel();
        let popup = PopupSpec {
            url: self.api.resolve(&provider.auth_path()),
            window_name: LOGIN_WINDOW_NAME,
            width: LOGIN_WINDOW_WIDTH,
            height: LOGIN_WINDOW_HEIGHT,
        };

        (
            PendingLogin {
                provider,
                popup,
                done: done_rx,
            },
            LoginCompletion {
                provider,
                done: done_tx,
            },
        )
    }

    /// Wait for the popup to report back, then reload the user.
    ///
    /// Fails with [`FeedError::LoginAbandoned`] if the completion was dropped
    /// without firing (popup closed).
    pub async fn finish_login(&self, pending: PendingLogin) -> Result<Option<User>> {
        if pending.done.await.is_err() {
            warn!("Login with {} abandoned", pending.provider);
            return Err(FeedError::LoginAbandoned(pending.provider.to_string()));
        }
        self.refresh_user().await
    }

    // === Private Implementation ===

    async fn after_signature_change(&self, user: Option<User>) -> Result<Option<User>> {
        self.set_user(user.clone());
        self.feed.refresh_total().await?;
        self.feed
            .refresh(self.feed.config().machine.default_page_size)
            .await?;
        Ok(user)
    }

    fn set_user(&self, user: Option<User>) {
        self.state.send_modify(|s| {
            s.user = user;
            s.last_error = None;
        });
    }

    fn track<R>(&self, result: Result<R>) -> Result<R> {
        if let Err(e) = &result {
            warn!("Session request failed: {}", e);
            let message = e.to_string();
            self.state.send_modify(|s| s.last_error = Some(message));
        }
        result
    }
}

fn describe(user: Option<&User>) -> &str {
    user.map(|u| u.identity.display_name())
        .unwrap_or("nobody")
}
