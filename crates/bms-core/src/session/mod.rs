//! Client-side session: who is signed in, where their credential is kept,
//! and which views that makes reachable.

pub mod manager;
pub mod routes;
pub mod store;

pub use manager::{Session, SessionEvent, SessionManager};
pub use routes::{Route, RouteDecision};
pub use store::{CredentialStore, FileStore, MemoryStore, IDENTITY_KEY, TOKEN_KEY};
