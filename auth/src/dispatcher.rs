//! Auth endpoint dispatcher.
//!
//! Every request to the auth endpoint goes to the [`AuthHandler`] and its
//! response is returned untouched, with one exception: the mobile sign-in
//! redirect. A sign-in carrying `expo-redirect=<url>` parks the URL in a
//! [`MarkerStore`] before delegating; the provider callback that follows is
//! answered with a `307` to that URL with the session token appended.
//!
//! # Flow
//!
//! ```text
//! GET  signin?expo-redirect=<url>   save marker, then handler.get
//! GET  callback (marker present)    handler.get, read token, clear marker, 307
//! GET  callback (no marker)         handler.get
//! GET  <other>                      handler.get
//! POST <any>                        handler.post
//! ```

use crate::config::MobileRedirectConfig;
use crate::error::{AuthError, Result};
use crate::marker::{CallbackOutcome, MarkerStore, RedirectState};
use crate::providers::AuthHandler;
use crate::route::AuthRoute;
use crate::session_token::extract_session_token;
use axum::extract::Request;
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};

/// Routes auth endpoint requests to the auth handler.
#[derive(Debug, Clone)]
pub struct AuthDispatcher<H> {
    handler: H,
    config: MobileRedirectConfig,
}

impl<H: AuthHandler> AuthDispatcher<H> {
    /// Dispatcher with the default mobile redirect configuration.
    #[must_use]
    pub fn new(handler: H) -> Self {
        Self {
            handler,
            config: MobileRedirectConfig::default(),
        }
    }

    /// Replace the mobile redirect configuration.
    #[must_use]
    pub fn with_config(mut self, config: MobileRedirectConfig) -> Self {
        self.config = config;
        self
    }

    /// The wrapped auth handler.
    #[must_use]
    pub const fn handler(&self) -> &H {
        &self.handler
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &MobileRedirectConfig {
        &self.config
    }

    /// Route by method: `POST` to [`Self::handle_post`], everything else to
    /// [`Self::handle_get`].
    ///
    /// # Errors
    ///
    /// Propagates failures from the auth handler and the marker store.
    pub async fn dispatch<M: MarkerStore>(
        &self,
        request: Request,
        route: &AuthRoute,
        markers: &M,
    ) -> Result<Response> {
        if request.method() == Method::POST {
            self.handle_post(request).await
        } else {
            self.handle_get(request, route, markers).await
        }
    }

    /// Delegate a `POST` unconditionally.
    ///
    /// # Errors
    ///
    /// Propagates failures from the auth handler.
    pub async fn handle_post(&self, request: Request) -> Result<Response> {
        tracing::debug!(path = %request.uri().path(), "Delegating auth POST");
        self.handler.post(request).await
    }

    /// Handle a `GET`, applying the mobile redirect flow for `signin` and
    /// `callback`.
    ///
    /// # Errors
    ///
    /// Propagates failures from the auth handler and the marker store.
    /// Returns [`AuthError::InvalidRequest`] if the redirect target cannot be
    /// used as a `Location` header.
    pub async fn handle_get<M: MarkerStore>(
        &self,
        request: Request,
        route: &AuthRoute,
        markers: &M,
    ) -> Result<Response> {
        match route {
            AuthRoute::SignIn => {
                if let Some(callback_url) = self.mobile_redirect(&request) {
                    self.begin_mobile_redirect(callback_url, markers)?;
                }
                self.handler.get(request).await
            }
            AuthRoute::Callback => self.complete_callback(request, markers).await,
            AuthRoute::Other(_) => self.handler.get(request).await,
        }
    }

    /// Non-empty `expo-redirect` value from the query string.
    fn mobile_redirect(&self, request: &Request) -> Option<String> {
        let query = request.uri().query()?;
        serde_urlencoded::from_str::<Vec<(String, String)>>(query)
            .ok()?
            .into_iter()
            .find(|(name, value)| *name == self.config.redirect_param && !value.is_empty())
            .map(|(_, value)| value)
    }

    fn begin_mobile_redirect<M: MarkerStore>(&self, callback_url: String, markers: &M) -> Result<()> {
        let previous = RedirectState::from_marker(markers.load()?);
        if previous.is_pending() {
            tracing::debug!("Replacing pending mobile redirect");
        }

        if let RedirectState::PendingRedirect(marker) = previous.begin(callback_url) {
            markers.save(&marker, self.config.marker_ttl)?;
            tracing::info!(callback_url = %marker.callback_url, "Mobile redirect started");
            metrics::counter!("auth.mobile_redirect.started").increment(1);
        }
        Ok(())
    }

    async fn complete_callback<M: MarkerStore>(
        &self,
        request: Request,
        markers: &M,
    ) -> Result<Response> {
        let state = RedirectState::from_marker(markers.load()?);
        if !state.is_pending() {
            return self.handler.get(request).await;
        }

        let response = self.handler.get(request).await?;
        let token = extract_session_token(response.headers(), &self.config.session_cookie);
        let (_, outcome) = state.complete(token.as_ref());
        markers.clear()?;

        match outcome {
            CallbackOutcome::Redirect { location } => {
                let value = HeaderValue::from_str(&location).map_err(|e| {
                    AuthError::InvalidRequest(format!("Invalid mobile redirect target: {e}"))
                })?;
                tracing::info!("Mobile redirect completed");
                metrics::counter!("auth.mobile_redirect.completed").increment(1);
                Ok((StatusCode::TEMPORARY_REDIRECT, [(header::LOCATION, value)]).into_response())
            }
            CallbackOutcome::MissingToken { callback_url } => {
                tracing::warn!(
                    callback_url = %callback_url,
                    status = %response.status(),
                    "Callback issued no session token, mobile redirect dropped"
                );
                metrics::counter!("auth.mobile_redirect.missing_token").increment(1);
                Ok(response)
            }
            CallbackOutcome::NotPending => Ok(response),
        }
    }
}
