//! Behavioural tests and shared test support for the chat client.

mod behaviour;
pub(crate) mod support;
