//! Client credentials, scope sets, and the token state shared by every flow.

pub mod client;
pub mod scope;
pub mod secret;
pub mod state;

pub use client::*;
pub use scope::*;
pub use secret::*;
pub use state::*;
