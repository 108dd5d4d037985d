//! Credential sources feeding the token refresher.

mod oauth;

pub use oauth::OauthTokenSource;
