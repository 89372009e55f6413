//! Top-level facade crate for marquee.
//!
//! Re-exports core types and the server library so users can depend on a single crate.

pub mod core {
    pub use marquee_core::*;
}

pub mod server {
    pub use marquee_server::*;
}
