pub mod browser;
pub mod callback;
pub mod oauth;
pub mod secrets;
pub mod token_store;

pub use browser::{BrowserLauncher, PrintOnly, SystemBrowser};
pub use callback::{AuthSignal, CallbackListener, CancelFlag, LoopbackListener};
pub use oauth::{Authenticator, HttpTokenEndpoint, TokenEndpoint};
pub use secrets::load_client_secret;
pub use token_store::{CredentialStore, FileTokenStore};
