use crate::error::{ApiError, ViewError};
use crate::models::auth::Session;
use crate::models::config::SessionConfig;
use crate::services::cookies::{CookieOptions, CookieStore};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

pub const TOKEN_COOKIE: &str = "token";
pub const USERNAME_COOKIE: &str = "username";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Landing,
    Upload,
    Stats,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Landing => "/",
            Route::Upload => "/upload",
            Route::Stats => "/stats",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Receives route changes (the `window.location` of a headless front end).
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: Route);
}

/// Navigator that only remembers where it was sent.
#[derive(Debug, Default)]
pub struct HistoryNavigator {
    visited: Mutex<Vec<Route>>,
}

impl HistoryNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn visited(&self) -> Vec<Route> {
        self.visited.lock().clone()
    }

    pub fn last(&self) -> Option<Route> {
        self.visited.lock().last().copied()
    }
}

impl Navigator for HistoryNavigator {
    fn navigate(&self, route: Route) {
        info!("Navigating to {}", route);
        self.visited.lock().push(route);
    }
}

/// Session state derived entirely from the cookie store.
#[derive(Clone)]
pub struct SessionManager {
    cookies: Arc<dyn CookieStore>,
    navigator: Arc<dyn Navigator>,
    expiry_days: i64,
    redirect_delay: Duration,
}

impl SessionManager {
    pub fn new(
        cookies: Arc<dyn CookieStore>,
        navigator: Arc<dyn Navigator>,
        config: &SessionConfig,
    ) -> Self {
        Self {
            cookies,
            navigator,
            expiry_days: config.expiry_days,
            redirect_delay: config.redirect_delay(),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.cookies.get(TOKEN_COOKIE).is_some()
    }

    pub fn current(&self) -> Option<Session> {
        let token = self.cookies.get(TOKEN_COOKIE)?;
        Some(Session {
            token,
            username: self.cookies.get(USERNAME_COOKIE).unwrap_or_default(),
        })
    }

    pub fn start(&self, session: &Session) {
        let options = CookieOptions::days(self.expiry_days);
        self.cookies.set(TOKEN_COOKIE, &session.token, options.clone());
        self.cookies.set(USERNAME_COOKIE, &session.username, options);
        info!("Session started for {}", session.username);
    }

    pub fn navigate(&self, route: Route) {
        self.navigator.navigate(route);
    }

    /// Guard for protected views: without a session the user is sent to the
    /// landing route and the caller must stop.
    pub fn require_auth(&self) -> Result<Session, ViewError> {
        match self.current() {
            Some(session) => Ok(session),
            None => {
                self.navigator.navigate(Route::Landing);
                Err(ViewError::AuthRequired)
            }
        }
    }

    /// Clears the session when `error` is a session failure and redirects to
    /// the landing route once the redirect delay has elapsed. Returns whether
    /// the forced logout was triggered.
    pub fn on_unauthorized(&self, error: &ApiError) -> bool {
        if !error.is_session_failure() {
            return false;
        }

        warn!("Session rejected by server: {}", error);
        self.clear();

        let navigator = Arc::clone(&self.navigator);
        let delay = self.redirect_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            navigator.navigate(Route::Landing);
        });

        true
    }

    pub fn logout(&self) {
        self.clear();
        info!("Logged out");
        self.navigator.navigate(Route::Landing);
    }

    fn clear(&self) {
        self.cookies.remove(TOKEN_COOKIE);
        self.cookies.remove(USERNAME_COOKIE);
    }
}
