//! Core types and trait definitions for twine.
//!
//! twine mirrors a provider-hosted flat message log into a local cache and
//! derives conversation threads from it on read. This crate holds the domain
//! types, the pure projection from raw provider records to thread views, and
//! the two seams every other crate is written against: [`MessageStore`] and
//! [`RemoteSource`]. It has no I/O of its own.

// Native `async fn` in traits; `Send` bounds are spelled out on the returned
// futures instead.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod event;
pub mod identity;
pub mod message;
pub mod page;
pub mod projection;
pub mod source;
pub mod store;
pub mod thread;

pub use error::{Error, Result};
pub use source::RemoteSource;
pub use store::MessageStore;
