//! Session establishment against the login-gated deployment.
//!
//! The handshake seeds cookies, discovers an optional anti-forgery token, posts
//! the credentials and decides from the response (or a follow-up probe of the
//! protected listing) whether the shared cookie jar now holds a session.

mod credentials;
mod error;
mod login;
mod token;

pub use credentials::Credentials;
pub use error::AuthError;
pub use login::{
    AuthOptions, AuthenticatedSession, LoginEvidence, LoginTransport, LoginVerdict,
    authenticate, classify_login_response, looks_like_login_prompt,
};
pub use token::{AntiForgeryToken, TokenSource, discover_token, hidden_login_fields};
