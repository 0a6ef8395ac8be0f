use super::{Notice, Pending, ViewState};
use crate::error::ViewError;
use crate::models::auth::Session;
use crate::services::api::Backend;
use crate::services::session::{Route, SessionManager};
use std::sync::Arc;
use tracing::info;

pub const PASSWORD_MISMATCH: &str = "Passwords do not match";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthTab {
    #[default]
    Login,
    Register,
}

/// Landing page: login and register forms behind a tab control.
pub struct AuthController {
    backend: Arc<dyn Backend>,
    session: SessionManager,
    tab: AuthTab,
    login: ViewState<Session>,
    register: ViewState<String>,
    login_username: String,
    notice: Option<Notice>,
}

impl AuthController {
    pub fn new(backend: Arc<dyn Backend>, session: SessionManager) -> Self {
        Self {
            backend,
            session,
            tab: AuthTab::Login,
            login: ViewState::Idle,
            register: ViewState::Idle,
            login_username: String::new(),
            notice: None,
        }
    }

    /// Sends an already signed-in user straight to the upload page.
    pub fn open(&self) -> bool {
        if self.session.is_authenticated() {
            self.session.navigate(Route::Upload);
            return true;
        }
        false
    }

    pub fn select_tab(&mut self, tab: AuthTab) {
        self.tab = tab;
        self.login = ViewState::Idle;
        self.register = ViewState::Idle;
    }

    pub fn tab(&self) -> AuthTab {
        self.tab
    }

    pub fn login_form_visible(&self) -> bool {
        self.tab == AuthTab::Login
    }

    pub fn register_form_visible(&self) -> bool {
        self.tab == AuthTab::Register
    }

    pub fn login_error(&self) -> Option<&str> {
        self.login.error()
    }

    pub fn register_error(&self) -> Option<&str> {
        self.register.error()
    }

    /// Value of the login form's username field.
    pub fn login_username(&self) -> &str {
        &self.login_username
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub async fn login(&mut self, login: &str, password: &str) -> Result<Session, ViewError> {
        self.login_username = login.to_string();
        let pending = Pending::begin(&mut self.login, None);

        match self.backend.login(login, password).await {
            Ok(response) => {
                let session = Session::from(response);
                self.session.start(&session);
                pending.finish(ViewState::Success(session.clone()));
                self.session.navigate(Route::Upload);
                Ok(session)
            }
            Err(e) => {
                pending.finish(ViewState::Error(e.to_string()));
                Err(e.into())
            }
        }
    }

    pub async fn register(
        &mut self,
        login: &str,
        password: &str,
        confirmation: &str,
    ) -> Result<String, ViewError> {
        if password != confirmation {
            self.register = ViewState::Error(PASSWORD_MISMATCH.to_string());
            return Err(ViewError::Validation(PASSWORD_MISMATCH.to_string()));
        }

        let pending = Pending::begin(&mut self.register, None);

        match self.backend.register(login, password).await {
            Ok(response) => {
                info!("Registered {}", response.login);
                pending.finish(ViewState::Success(response.login.clone()));
                self.notice = Some(Notice::info(format!(
                    "Registration successful! You can now log in as {}",
                    response.login
                )));
                self.tab = AuthTab::Login;
                self.login = ViewState::Idle;
                self.login_username = response.login.clone();
                Ok(response.login)
            }
            Err(e) => {
                pending.finish(ViewState::Error(e.to_string()));
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controllers::testing::{harness, signed_in};
    use crate::error::ApiError;
    use crate::models::auth::{LoginResponse, RegisterResponse};
    use crate::services::api::MockBackend;
    use crate::services::cookies::CookieStore;
    use mockall::predicate::eq;

    #[tokio::test]
    async fn test_login_persists_session_and_navigates() {
        let h = harness();
        let mut backend = MockBackend::new();
        backend
            .expect_login()
            .with(eq("alice"), eq("secret"))
            .times(1)
            .returning(|_, _| {
                Ok(LoginResponse {
                    token: "abc123".to_string(),
                    username: "alice".to_string(),
                })
            });

        let mut controller = AuthController::new(Arc::new(backend), h.session.clone());
        let session = controller.login("alice", "secret").await.unwrap();

        assert_eq!(session.token, "abc123");
        assert_eq!(h.cookies.get("token").as_deref(), Some("abc123"));
        assert_eq!(h.cookies.get("username").as_deref(), Some("alice"));
        assert_eq!(h.navigator.visited(), vec![Route::Upload]);
        assert!(controller.login_error().is_none());
    }

    #[tokio::test]
    async fn test_login_failure_shows_server_message() {
        let h = harness();
        let mut backend = MockBackend::new();
        backend.expect_login().returning(|_, _| {
            Err(ApiError::from_response(
                401,
                Some(&serde_json::json!({ "error": "Invalid login or password" })),
            ))
        });

        let mut controller = AuthController::new(Arc::new(backend), h.session.clone());
        let result = controller.login("alice", "nope").await;

        assert!(matches!(result, Err(ViewError::Api(_))));
        assert_eq!(controller.login_error(), Some("Invalid login or password"));
        assert!(h.navigator.visited().is_empty());
        assert_eq!(h.cookies.get("token"), None);
    }

    #[tokio::test]
    async fn test_register_mismatch_skips_network() {
        let h = harness();
        let mut backend = MockBackend::new();
        backend.expect_register().never();

        let mut controller = AuthController::new(Arc::new(backend), h.session.clone());
        controller.select_tab(AuthTab::Register);
        let result = controller.register("bob", "one", "two").await;

        assert!(matches!(result, Err(ViewError::Validation(_))));
        assert_eq!(controller.register_error(), Some(PASSWORD_MISMATCH));
        assert!(controller.register_form_visible());
    }

    #[tokio::test]
    async fn test_register_success_switches_to_login_prefilled() {
        let h = harness();
        let mut backend = MockBackend::new();
        backend
            .expect_register()
            .with(eq("bob"), eq("pw"))
            .returning(|login, _| {
                Ok(RegisterResponse {
                    login: login.to_string(),
                })
            });

        let mut controller = AuthController::new(Arc::new(backend), h.session.clone());
        controller.select_tab(AuthTab::Register);
        controller.register("bob", "pw", "pw").await.unwrap();

        assert_eq!(controller.tab(), AuthTab::Login);
        assert!(controller.login_form_visible());
        assert!(!controller.register_form_visible());
        assert_eq!(controller.login_username(), "bob");
        assert!(controller.notice().unwrap().text.contains("bob"));
        assert!(!h.session.is_authenticated());
    }

    #[tokio::test]
    async fn test_register_failure_stays_on_register() {
        let h = harness();
        let mut backend = MockBackend::new();
        backend.expect_register().returning(|_, _| {
            Err(ApiError::from_response(
                409,
                Some(&serde_json::json!({ "error": "User already exists" })),
            ))
        });

        let mut controller = AuthController::new(Arc::new(backend), h.session.clone());
        controller.select_tab(AuthTab::Register);
        assert!(controller.register("taken", "pw", "pw").await.is_err());

        assert_eq!(controller.register_error(), Some("User already exists"));
        assert_eq!(controller.tab(), AuthTab::Register);
    }

    #[test]
    fn test_switching_tabs_clears_errors() {
        let h = harness();
        let mut controller = AuthController::new(Arc::new(MockBackend::new()), h.session.clone());
        controller.register = ViewState::Error(PASSWORD_MISMATCH.to_string());

        controller.select_tab(AuthTab::Login);
        assert!(controller.register_error().is_none());
        assert!(controller.login_form_visible() != controller.register_form_visible());
    }

    #[test]
    fn test_open_redirects_signed_in_user() {
        let h = signed_in();
        let controller = AuthController::new(Arc::new(MockBackend::new()), h.session.clone());
        assert!(controller.open());
        assert_eq!(h.navigator.last(), Some(Route::Upload));

        let h = harness();
        let controller = AuthController::new(Arc::new(MockBackend::new()), h.session.clone());
        assert!(!controller.open());
        assert!(h.navigator.visited().is_empty());
    }
}
