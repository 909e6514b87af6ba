//! Attaching manager-issued bearer tokens to outgoing Web API requests.

pub mod request_signer;

pub use request_signer::*;
