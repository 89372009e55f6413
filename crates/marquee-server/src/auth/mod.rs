//! Session authentication.
//!
//! The authenticator is wired from two capabilities: a credential lookup and a
//! session store. Both are traits so a real credential backend or an external
//! session store can replace the in-memory defaults.

mod authenticator;
mod credentials;
mod session_store;

pub use authenticator::{LoginGrant, SessionAuthenticator};
pub use credentials::{CredentialLookup, StaticCredentials};
pub use session_store::{MemorySessionStore, SessionStore};
