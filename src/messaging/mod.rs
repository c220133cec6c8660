//! Messaging module for bloodboard server
//!
//! Direct messages between two registered users, scoped by the identity the
//! authenticator resolved for the caller.

pub mod handlers;
mod service;

pub use service::ConversationService;
