//! Built-in command handlers.
//!
//! `entry` holds the generic handlers registered once per entry kind by
//! [`Service::entry`](super::Service::entry); `user_get` follows the
//! single-command convention (`COMMAND`, `guard`, `handle`).

pub mod entry;
pub mod user_get;
