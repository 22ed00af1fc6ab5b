//! axum handlers, one module per resource.
//!
//! Every handler takes the session's [`Facade`](crate::facade::Facade) as
//! state and is generic over the store and source behind it.

pub mod account;
pub mod messages;
pub mod sync;
pub mod threads;
