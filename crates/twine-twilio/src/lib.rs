//! Twilio Programmable Messaging as a [`twine_core::RemoteSource`].
//!
//! Twilio exposes each account's messages as one flat log filtered by sender
//! or recipient number. This crate fetches both directions for the account's
//! number and merges them; thread inference happens elsewhere.

mod client;
mod wire;

pub mod error;

pub use client::{Credentials, DEFAULT_BASE_URL, TwilioClient};
pub use error::{Error, Result};
