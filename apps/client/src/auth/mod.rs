//! OAuth flow handling and the session gateway.

mod callback;
mod flow;
mod gateway;

pub use callback::CallbackRegistry;
pub use flow::{
    CallbackOAuthFlow, OAuthFlow, RedirectOAuthFlow, UrlPresenter, DEFAULT_HANDSHAKE_TIMEOUT,
    REDIRECT_GRACE,
};
pub use gateway::AuthGateway;
