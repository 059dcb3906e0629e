//! Procedure implementations, one module per namespace.
//!
//! Each procedure is a plain async function over the request context and its
//! typed input. Authorization and input decoding happen in the router before
//! these run.

pub mod auth;
pub mod post;
