//! Collaborator interfaces of the RPC procedures.
//!
//! Sessions come from [`acme_auth::SessionStore`]; posts from
//! [`PostRepository`].

pub mod posts;

pub use posts::PostRepository;
