//! In-memory stores for bloodboard server
//!
//! Each store owns one shared map or log behind its own lock. They are built
//! once in `AppState` and handed to the services by `Arc`.

pub mod accounts;
pub mod messages;
pub mod models;
pub mod sessions;

pub use accounts::AccountStore;
pub use messages::MessageLog;
pub use models::{Identity, Message, MessageId, Role, Session, UserId};
pub use sessions::SessionRegistry;
