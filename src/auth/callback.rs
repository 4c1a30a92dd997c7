use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use url::Url;

use crate::error::{BackupError, BackupResult};

const CALLBACK_PATH: &str = "/callback";
const POLL_INTERVAL: Duration = Duration::from_millis(50);
const READ_TIMEOUT: Duration = Duration::from_secs(10);

/// What the browser redirect delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthSignal {
    Code { code: String, state: String },
    Denied(String),
}

/// An ephemeral endpoint the authorization server redirects back to.
/// Dropping it releases the endpoint.
pub trait CallbackListener {
    fn redirect_uri(&self) -> &str;

    fn signals(&self) -> &Receiver<AuthSignal>;
}

/// Cooperative cancellation for the authorization wait, set from Ctrl-C.
/// Interrupts only count while a wait is in progress.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag {
    flag: Arc<AtomicBool>,
    waiting: Arc<AtomicBool>,
}

/// Marks a wait as in progress until dropped.
pub struct WaitGuard {
    waiting: Arc<AtomicBool>,
}

impl Drop for WaitGuard {
    fn drop(&mut self) {
        self.waiting.store(false, Ordering::SeqCst);
    }
}

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// A flag raised by Ctrl-C during the authorization wait. Outside the
    /// wait Ctrl-C terminates the process with status 130. If the handler
    /// can't be registered the default signal behavior stays in place.
    pub fn from_ctrlc() -> Self {
        let cancel = Self::new();
        let handler = cancel.clone();
        let installed = ctrlc::set_handler(move || {
            if !handler.interrupt() {
                std::process::exit(130);
            }
        });
        if let Err(e) = installed {
            tracing::warn!(error = %e, "could not install Ctrl-C handler");
        }
        cancel
    }

    /// Records an interrupt. Returns false when no wait is in progress,
    /// in which case the interrupt is left to the caller.
    pub fn interrupt(&self) -> bool {
        if self.waiting.load(Ordering::SeqCst) {
            self.cancel();
            true
        } else {
            false
        }
    }

    pub fn arm(&self) -> WaitGuard {
        self.waiting.store(true, Ordering::SeqCst);
        WaitGuard {
            waiting: Arc::clone(&self.waiting),
        }
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Blocks until the first of: an authorization code, an authorization
/// error, cancellation, or `timeout`.
pub fn await_authorization(
    signals: &Receiver<AuthSignal>,
    expected_state: &str,
    cancel: &CancelFlag,
    timeout: Duration,
) -> BackupResult<String> {
    let _waiting = cancel.arm();
    let deadline = Instant::now() + timeout;
    loop {
        if cancel.is_cancelled() {
            return Err(BackupError::AuthorizationCancelled);
        }
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(BackupError::AuthorizationTimeout(timeout.as_secs()));
        }

        match signals.recv_timeout(remaining.min(POLL_INTERVAL)) {
            Ok(AuthSignal::Code { code, state }) => {
                if state != expected_state {
                    return Err(BackupError::AuthorizationDenied(
                        "state parameter mismatch".into(),
                    ));
                }
                return Ok(code);
            }
            Ok(AuthSignal::Denied(reason)) => return Err(BackupError::AuthorizationDenied(reason)),
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => {
                return Err(BackupError::AuthorizationDenied(
                    "callback listener stopped unexpectedly".into(),
                ))
            }
        }
    }
}

/// HTTP listener on an OS-assigned loopback port.
pub struct LoopbackListener {
    redirect_uri: String,
    receiver: Receiver<AuthSignal>,
    stop: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl LoopbackListener {
    pub fn bind() -> BackupResult<Self> {
        let listener = TcpListener::bind(("127.0.0.1", 0))?;
        listener.set_nonblocking(true)?;
        let port = listener.local_addr()?.port();
        let redirect_uri = format!("http://127.0.0.1:{}{}", port, CALLBACK_PATH);

        let (tx, receiver) = mpsc::channel();
        let stop = Arc::new(AtomicBool::new(false));
        let worker_stop = Arc::clone(&stop);
        let worker = thread::Builder::new()
            .name("oauth-callback".into())
            .spawn(move || serve(listener, tx, worker_stop))?;

        tracing::debug!(%redirect_uri, "callback listener started");
        Ok(Self {
            redirect_uri,
            receiver,
            stop,
            worker: Some(worker),
        })
    }
}

impl CallbackListener for LoopbackListener {
    fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    fn signals(&self) -> &Receiver<AuthSignal> {
        &self.receiver
    }
}

impl Drop for LoopbackListener {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
        tracing::debug!("callback listener stopped");
    }
}

fn serve(listener: TcpListener, tx: Sender<AuthSignal>, stop: Arc<AtomicBool>) {
    let mut delivered = false;
    while !stop.load(Ordering::SeqCst) {
        match listener.accept() {
            Ok((stream, _)) => {
                let signal = match handle_connection(stream, delivered) {
                    Ok(signal) => signal,
                    Err(e) => {
                        tracing::debug!(error = %e, "dropping malformed callback request");
                        None
                    }
                };
                if let Some(signal) = signal {
                    delivered = true;
                    if tx.send(signal).is_err() {
                        return;
                    }
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => thread::sleep(POLL_INTERVAL),
            Err(e) => {
                tracing::warn!(error = %e, "callback listener failed");
                return;
            }
        }
    }
}

fn handle_connection(stream: TcpStream, delivered: bool) -> std::io::Result<Option<AuthSignal>> {
    stream.set_nonblocking(false)?;
    stream.set_read_timeout(Some(READ_TIMEOUT))?;

    let mut reader = BufReader::new(stream.try_clone()?);
    let mut request_line = String::new();
    reader.read_line(&mut request_line)?;
    let target = request_line.split_whitespace().nth(1).unwrap_or("");

    // drain the headers so closing the socket doesn't reset the connection
    let mut header = String::new();
    loop {
        header.clear();
        let n = reader.read_line(&mut header)?;
        if n == 0 || header.trim_end().is_empty() {
            break;
        }
    }

    let signal = if delivered { None } else { parse_callback(target) };
    let (status, body) = match (&signal, delivered) {
        (Some(AuthSignal::Code { .. }), _) => ("200 OK", success_page()),
        (Some(AuthSignal::Denied(reason)), _) => ("200 OK", failure_page(reason)),
        (None, true) => ("200 OK", "<html><body><p>You can close this window.</p></body></html>".to_string()),
        (None, false) => ("404 Not Found", "<html><body><p>Not found.</p></body></html>".to_string()),
    };

    let mut stream = stream;
    write!(
        stream,
        "HTTP/1.1 {}\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    )?;
    stream.flush()?;
    Ok(signal)
}

/// Interprets a request target such as `/callback?code=...&state=...`.
/// Returns `None` for anything that isn't the callback path.
pub fn parse_callback(target: &str) -> Option<AuthSignal> {
    let url = Url::parse("http://127.0.0.1").ok()?.join(target).ok()?;
    if url.path() != CALLBACK_PATH {
        return None;
    }

    let query = |key: &str| {
        url.query_pairs()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
            .filter(|v| !v.is_empty())
    };

    match query("code") {
        Some(code) => Some(AuthSignal::Code {
            code,
            state: query("state").unwrap_or_default(),
        }),
        None => Some(AuthSignal::Denied(
            query("error").unwrap_or_else(|| "no authorization code received".into()),
        )),
    }
}

fn success_page() -> String {
    "<html><body><h1>Authorization Successful!</h1><p>You can close this window and return to the terminal.</p></body></html>".to_string()
}

fn failure_page(reason: &str) -> String {
    let escaped = reason
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;");
    format!(
        "<html><body><h1>Authorization Failed</h1><p>{}</p><p>You can close this window.</p></body></html>",
        escaped
    )
}
