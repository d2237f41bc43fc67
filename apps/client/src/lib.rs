//! Client-side session authentication and flashcard-set reconciliation.
//!
//! The pieces fit together like this: [`auth::AuthGateway`] combines a
//! [`session::SessionStore`] with an [`auth::OAuthFlow`] to establish and
//! persist a session; once a session exists, [`sync::FlashcardSyncRepository`]
//! uses the authenticated [`remote::RemoteApi`] to reconcile the local
//! [`store::FlashcardStore`] against the remote flashcard service.

pub mod auth;
pub mod db;
pub mod error;
pub mod remote;
pub mod session;
pub mod store;
pub mod sync;

pub use auth::{AuthGateway, CallbackRegistry, OAuthFlow, UrlPresenter};
pub use error::{ClientError, Result};
pub use remote::{HttpRemoteClient, RemoteApi};
pub use session::{MemorySessionStore, SessionStore};
pub use store::{FlashcardStore, MemoryFlashcardStore};
pub use sync::{FlashcardSyncRepository, SyncStats};
