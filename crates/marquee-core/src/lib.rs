//! marquee core: transport-agnostic domain types and the shared error surface.
//!
//! This crate defines the records exchanged between the session authenticator,
//! the listing gateway, and the HTTP layer. It carries no runtime or HTTP
//! dependencies so it can be reused by alternative front-ends and test tools.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here.
//! All fallible paths must surface as `MarqueeError`/`Result`.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod model;

/// Shared result type.
pub use error::{ClientCode, MarqueeError, Result};
pub use model::{Movie, SessionData, SessionUser, User, LISTING_LIMIT};
