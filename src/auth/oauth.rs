use std::time::Duration;

use chrono::Utc;
use serde::Deserialize;
use url::Url;
use uuid::Uuid;

use super::browser::{BrowserLauncher, SystemBrowser};
use super::callback::{await_authorization, CallbackListener, CancelFlag, LoopbackListener};
use super::token_store::CredentialStore;
use crate::config::{OAuthEndpoints, CALLBACK_TIMEOUT};
use crate::error::{BackupError, BackupResult};
use crate::model::{ClientSecret, Token};

const TOKEN_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// The token half of the OAuth2 protocol: code exchange and refresh.
pub trait TokenEndpoint {
    fn exchange_code(&self, code: &str, redirect_uri: &str) -> BackupResult<Token>;

    fn refresh(&self, refresh_token: &str) -> BackupResult<Token>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    token_type: String,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
}

impl TokenResponse {
    fn into_token(self) -> Token {
        Token {
            access_token: self.access_token,
            token_type: self.token_type,
            refresh_token: self.refresh_token.filter(|t| !t.is_empty()),
            expiry: self
                .expires_in
                .map(|secs| Utc::now() + chrono::Duration::seconds(secs)),
        }
    }
}

/// Form-encoded token requests over HTTP.
pub struct HttpTokenEndpoint {
    token_url: String,
    secret: ClientSecret,
}

impl HttpTokenEndpoint {
    pub fn new(token_url: &str, secret: ClientSecret) -> Self {
        Self {
            token_url: token_url.to_string(),
            secret,
        }
    }

    fn request(&self, form: &[(&str, &str)]) -> BackupResult<Token> {
        let response = ureq::post(&self.token_url)
            .timeout(TOKEN_REQUEST_TIMEOUT)
            .send_form(form)
            .map_err(|e| match e {
                ureq::Error::Status(code, resp) => {
                    let body = resp.into_string().unwrap_or_default();
                    let excerpt: String = body.chars().take(200).collect();
                    BackupError::TokenExchange(format!("HTTP {}: {}", code, excerpt))
                }
                ureq::Error::Transport(t) => BackupError::TokenExchange(t.to_string()),
            })?;

        let parsed: TokenResponse = response
            .into_json()
            .map_err(|e| BackupError::TokenExchange(format!("unreadable token response: {}", e)))?;
        Ok(parsed.into_token())
    }
}

impl TokenEndpoint for HttpTokenEndpoint {
    fn exchange_code(&self, code: &str, redirect_uri: &str) -> BackupResult<Token> {
        self.request(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", redirect_uri),
            ("client_id", &self.secret.client_id),
            ("client_secret", &self.secret.client_secret),
        ])
    }

    fn refresh(&self, refresh_token: &str) -> BackupResult<Token> {
        self.request(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", &self.secret.client_id),
            ("client_secret", &self.secret.client_secret),
        ])
    }
}

type ListenerFactory = Box<dyn Fn() -> BackupResult<Box<dyn CallbackListener>>>;

/// Turns the client registration plus the cached credential into a live
/// access token, running the browser flow when nothing cached is usable.
pub struct Authenticator {
    secret: ClientSecret,
    endpoints: OAuthEndpoints,
    store: Box<dyn CredentialStore>,
    token_endpoint: Box<dyn TokenEndpoint>,
    browser: Box<dyn BrowserLauncher>,
    bind_listener: ListenerFactory,
    cancel: CancelFlag,
    timeout: Duration,
}

impl Authenticator {
    pub fn new(secret: ClientSecret, endpoints: OAuthEndpoints, store: Box<dyn CredentialStore>) -> Self {
        let token_endpoint = HttpTokenEndpoint::new(&endpoints.token_url, secret.clone());
        Self {
            secret,
            endpoints,
            store,
            token_endpoint: Box::new(token_endpoint),
            browser: Box::new(SystemBrowser),
            bind_listener: Box::new(|| {
                LoopbackListener::bind().map(|l| Box::new(l) as Box<dyn CallbackListener>)
            }),
            cancel: CancelFlag::new(),
            timeout: CALLBACK_TIMEOUT,
        }
    }

    pub fn with_token_endpoint(mut self, endpoint: Box<dyn TokenEndpoint>) -> Self {
        self.token_endpoint = endpoint;
        self
    }

    pub fn with_browser(mut self, browser: Box<dyn BrowserLauncher>) -> Self {
        self.browser = browser;
        self
    }

    pub fn with_listener<F>(mut self, bind: F) -> Self
    where
        F: Fn() -> BackupResult<Box<dyn CallbackListener>> + 'static,
    {
        self.bind_listener = Box::new(bind);
        self
    }

    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Cached token if still valid, else a refreshed one, else a new one
    /// from the browser flow. Refresh failures fall through to the browser.
    pub fn get_token(&self) -> BackupResult<Token> {
        let cached = self.store.load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "could not read cached token");
            None
        });

        if let Some(token) = cached {
            if token.is_valid() {
                tracing::debug!("using cached token");
                return Ok(token);
            }
            if let Some(refresh_token) = token.usable_refresh_token() {
                match self.token_endpoint.refresh(refresh_token) {
                    Ok(mut fresh) => {
                        if fresh.refresh_token.is_none() {
                            fresh.refresh_token = token.refresh_token.clone();
                        }
                        tracing::info!("refreshed access token");
                        self.persist(&fresh);
                        return Ok(fresh);
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "token refresh failed, re-authorizing in the browser")
                    }
                }
            }
        }

        let token = self.authorize_interactively()?;
        self.persist(&token);
        Ok(token)
    }

    /// Runs the browser flow regardless of any cached token.
    pub fn authorize_interactively(&self) -> BackupResult<Token> {
        let listener = (self.bind_listener)()?;
        let redirect_uri = listener.redirect_uri().to_string();
        let state = Uuid::new_v4().simple().to_string();
        let url = self.authorization_url(&redirect_uri, &state)?;

        if let Err(e) = self.browser.open(&url) {
            tracing::warn!(error = %e, "couldn't open browser automatically");
        }

        let outcome = await_authorization(listener.signals(), &state, &self.cancel, self.timeout);
        drop(listener);
        let code = outcome?;

        tracing::debug!("exchanging authorization code");
        self.token_endpoint.exchange_code(&code, &redirect_uri)
    }

    /// Consent page URL requesting offline access, so a refresh token is issued.
    pub fn authorization_url(&self, redirect_uri: &str, state: &str) -> BackupResult<String> {
        let url = Url::parse_with_params(
            &self.endpoints.auth_url,
            &[
                ("client_id", self.secret.client_id.as_str()),
                ("redirect_uri", redirect_uri),
                ("response_type", "code"),
                ("scope", self.endpoints.scope.as_str()),
                ("state", state),
                ("access_type", "offline"),
                ("prompt", "consent"),
            ],
        )
        .map_err(|e| BackupError::Other(format!("invalid authorization URL: {}", e)))?;
        Ok(url.into())
    }

    fn persist(&self, token: &Token) {
        if let Err(e) = self.store.save(token) {
            tracing::warn!(error = %e, "failed to save token");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::callback::AuthSignal;
    use chrono::Duration as ChronoDuration;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::mpsc::{self, Receiver, Sender};
    use std::sync::Arc;

    #[derive(Default, Clone)]
    struct MemoryStore {
        token: Rc<RefCell<Option<Token>>>,
        saves: Rc<RefCell<usize>>,
    }

    impl CredentialStore for MemoryStore {
        fn load(&self) -> BackupResult<Option<Token>> {
            Ok(self.token.borrow().clone())
        }

        fn save(&self, token: &Token) -> BackupResult<()> {
            *self.token.borrow_mut() = Some(token.clone());
            *self.saves.borrow_mut() += 1;
            Ok(())
        }
    }

    #[derive(Clone)]
    struct FakeEndpoint {
        refresh_ok: bool,
        calls: Rc<RefCell<Vec<String>>>,
    }

    impl TokenEndpoint for FakeEndpoint {
        fn exchange_code(&self, code: &str, redirect_uri: &str) -> BackupResult<Token> {
            self.calls
                .borrow_mut()
                .push(format!("exchange:{}:{}", code, redirect_uri));
            Ok(fresh_token("from-code", Some("new-refresh")))
        }

        fn refresh(&self, refresh_token: &str) -> BackupResult<Token> {
            self.calls.borrow_mut().push(format!("refresh:{}", refresh_token));
            if self.refresh_ok {
                Ok(fresh_token("from-refresh", None))
            } else {
                Err(BackupError::TokenExchange("HTTP 400: invalid_grant".into()))
            }
        }
    }

    struct NoBrowser;

    impl BrowserLauncher for NoBrowser {
        fn open(&self, _url: &str) -> BackupResult<()> {
            Ok(())
        }
    }

    /// Delivers a scripted signal (or nothing) and records its own teardown.
    struct FakeListener {
        receiver: Receiver<AuthSignal>,
        _sender: Sender<AuthSignal>,
        released: Arc<AtomicBool>,
    }

    impl CallbackListener for FakeListener {
        fn redirect_uri(&self) -> &str {
            "http://127.0.0.1:9/callback"
        }

        fn signals(&self) -> &Receiver<AuthSignal> {
            &self.receiver
        }
    }

    impl Drop for FakeListener {
        fn drop(&mut self) {
            self.released.store(true, Ordering::SeqCst);
        }
    }

    fn fresh_token(access: &str, refresh: Option<&str>) -> Token {
        Token {
            access_token: access.into(),
            token_type: "Bearer".into(),
            refresh_token: refresh.map(String::from),
            expiry: Some(Utc::now() + ChronoDuration::hours(1)),
        }
    }

    fn expired_token(refresh: Option<&str>) -> Token {
        Token {
            expiry: Some(Utc::now() - ChronoDuration::hours(1)),
            ..fresh_token("stale", refresh)
        }
    }

    fn secret() -> ClientSecret {
        ClientSecret {
            client_id: "client.apps".into(),
            client_secret: "shh".into(),
        }
    }

    fn authenticator(store: MemoryStore, endpoint: FakeEndpoint) -> Authenticator {
        Authenticator::new(secret(), OAuthEndpoints::default(), Box::new(store))
            .with_token_endpoint(Box::new(endpoint))
            .with_browser(Box::new(NoBrowser))
    }

    fn silent_listener(released: Arc<AtomicBool>) -> impl Fn() -> BackupResult<Box<dyn CallbackListener>> {
        move || {
            let (tx, rx) = mpsc::channel();
            Ok(Box::new(FakeListener {
                receiver: rx,
                _sender: tx,
                released: Arc::clone(&released),
            }) as Box<dyn CallbackListener>)
        }
    }

    fn endpoint(refresh_ok: bool) -> FakeEndpoint {
        FakeEndpoint {
            refresh_ok,
            calls: Rc::new(RefCell::new(Vec::new())),
        }
    }

    #[test]
    fn valid_cached_token_is_used_directly() {
        let store = MemoryStore::default();
        *store.token.borrow_mut() = Some(fresh_token("cached", Some("r")));
        let ep = endpoint(true);
        let auth = authenticator(store.clone(), ep.clone());

        let token = auth.get_token().unwrap();
        assert_eq!(token.access_token, "cached");
        assert!(ep.calls.borrow().is_empty());
        assert_eq!(*store.saves.borrow(), 0);
    }

    #[test]
    fn expired_token_is_refreshed_and_persisted() {
        let store = MemoryStore::default();
        *store.token.borrow_mut() = Some(expired_token(Some("old-refresh")));
        let ep = endpoint(true);
        let auth = authenticator(store.clone(), ep.clone());

        let token = auth.get_token().unwrap();
        assert_eq!(token.access_token, "from-refresh");
        // the refresh response carried no refresh token; the old one is kept
        assert_eq!(token.refresh_token.as_deref(), Some("old-refresh"));
        assert_eq!(ep.calls.borrow().as_slice(), ["refresh:old-refresh"]);
        assert_eq!(*store.saves.borrow(), 1);
    }

    #[test]
    fn failed_refresh_falls_through_to_browser_flow() {
        let store = MemoryStore::default();
        *store.token.borrow_mut() = Some(expired_token(Some("revoked")));
        let ep = endpoint(false);
        let released = Arc::new(AtomicBool::new(false));
        let auth = authenticator(store, ep.clone())
            .with_listener(silent_listener(Arc::clone(&released)))
            .with_timeout(Duration::from_millis(100));

        let err = auth.get_token().unwrap_err();
        assert!(matches!(err, BackupError::AuthorizationTimeout(_)));
        assert_eq!(ep.calls.borrow().as_slice(), ["refresh:revoked"]);
    }

    #[test]
    fn browser_flow_times_out_and_releases_listener() {
        let released = Arc::new(AtomicBool::new(false));
        let auth = authenticator(MemoryStore::default(), endpoint(true))
            .with_listener(silent_listener(Arc::clone(&released)))
            .with_timeout(Duration::from_millis(100));

        let err = auth.authorize_interactively().unwrap_err();
        assert!(matches!(err, BackupError::AuthorizationTimeout(_)));
        assert!(released.load(Ordering::SeqCst));
    }

    #[test]
    fn browser_flow_cancelled_before_callback() {
        let cancel = CancelFlag::new();
        cancel.cancel();
        let auth = authenticator(MemoryStore::default(), endpoint(true))
            .with_listener(silent_listener(Arc::new(AtomicBool::new(false))))
            .with_cancel(cancel);

        let err = auth.authorize_interactively().unwrap_err();
        assert!(matches!(err, BackupError::AuthorizationCancelled));
    }

    #[test]
    fn launcher_gets_whole_url_and_its_failure_is_not_fatal() {
        struct BrokenBrowser {
            opened: Rc<RefCell<Vec<String>>>,
        }

        impl BrowserLauncher for BrokenBrowser {
            fn open(&self, url: &str) -> BackupResult<()> {
                self.opened.borrow_mut().push(url.to_string());
                Err(BackupError::Other("failed to open browser: no display".into()))
            }
        }

        let opened = Rc::new(RefCell::new(Vec::new()));
        let auth = authenticator(MemoryStore::default(), endpoint(true))
            .with_browser(Box::new(BrokenBrowser {
                opened: Rc::clone(&opened),
            }))
            .with_listener(silent_listener(Arc::new(AtomicBool::new(false))))
            .with_timeout(Duration::from_millis(100));

        let err = auth.authorize_interactively().unwrap_err();
        assert!(matches!(err, BackupError::AuthorizationTimeout(_)));

        let opened = opened.borrow();
        assert_eq!(opened.len(), 1);
        let url = Url::parse(&opened[0]).unwrap();
        let keys: Vec<String> = url.query_pairs().map(|(k, _)| k.into_owned()).collect();
        assert_eq!(
            keys,
            ["client_id", "redirect_uri", "response_type", "scope", "state", "access_type", "prompt"]
        );
    }

    #[test]
    fn browser_flow_exchanges_delivered_code() {
        // The state token is generated inside the flow, so the fake browser
        // plays the authorization server and echoes it back.
        struct EchoBrowser {
            sender: Sender<AuthSignal>,
        }

        impl BrowserLauncher for EchoBrowser {
            fn open(&self, url: &str) -> BackupResult<()> {
                let url = Url::parse(url).unwrap();
                let state = url
                    .query_pairs()
                    .find(|(k, _)| k == "state")
                    .map(|(_, v)| v.into_owned())
                    .unwrap();
                self.sender
                    .send(AuthSignal::Code {
                        code: "granted".into(),
                        state,
                    })
                    .unwrap();
                Ok(())
            }
        }

        let (tx, rx) = mpsc::channel();
        let receiver = RefCell::new(Some(rx));
        let keep_alive = tx.clone();
        let store = MemoryStore::default();
        let ep = endpoint(true);
        let auth = Authenticator::new(secret(), OAuthEndpoints::default(), Box::new(store.clone()))
            .with_token_endpoint(Box::new(ep.clone()))
            .with_browser(Box::new(EchoBrowser { sender: tx }))
            .with_listener(move || {
                let rx = receiver.borrow_mut().take().unwrap();
                Ok(Box::new(FakeListener {
                    receiver: rx,
                    _sender: keep_alive.clone(),
                    released: Arc::new(AtomicBool::new(false)),
                }) as Box<dyn CallbackListener>)
            });

        let token = auth.get_token().unwrap();
        assert_eq!(token.access_token, "from-code");
        assert_eq!(
            ep.calls.borrow().as_slice(),
            ["exchange:granted:http://127.0.0.1:9/callback"]
        );
        assert_eq!(store.token.borrow().as_ref(), Some(&token));
    }

    #[test]
    fn token_response_sets_expiry_and_drops_empty_refresh() {
        let response: TokenResponse = serde_json::from_str(
            r#"{"access_token": "ya29.x", "token_type": "Bearer", "expires_in": 3599,
                "refresh_token": "", "scope": "https://www.googleapis.com/auth/contacts"}"#,
        )
        .unwrap();
        let token = response.into_token();
        assert_eq!(token.access_token, "ya29.x");
        assert!(token.refresh_token.is_none());
        assert!(token.is_valid());
        assert!(token.expiry.unwrap() > Utc::now() + ChronoDuration::minutes(59));
    }

    #[test]
    fn authorization_url_requests_offline_consent() {
        let auth = authenticator(MemoryStore::default(), endpoint(true));
        let url = auth
            .authorization_url("http://127.0.0.1:5555/callback", "st4te")
            .unwrap();
        let parsed = Url::parse(&url).unwrap();
        let params: std::collections::HashMap<_, _> = parsed.query_pairs().into_owned().collect();
        assert_eq!(params["client_id"], "client.apps");
        assert_eq!(params["redirect_uri"], "http://127.0.0.1:5555/callback");
        assert_eq!(params["state"], "st4te");
        assert_eq!(params["access_type"], "offline");
        assert_eq!(params["prompt"], "consent");
        assert_eq!(params["scope"], crate::config::CONTACTS_SCOPE);
    }
}
