//! Business operations shared by the HTTP API and the terminal console.
//! Every function takes the pool and, where access is restricted, the
//! signed-in `Actor`, so both surfaces enforce the same role checks.

pub mod auth;
pub mod balance;
pub mod dashboard;
pub mod death_committee;
pub mod members;
pub mod services;
pub mod transactions;
pub mod validate;

use serde::Serialize;

/// Result of a write, with the confirmation shown to the user.
#[derive(Debug, Clone, Serialize)]
pub struct Done<T> {
    pub data: T,
    pub message: String,
}

impl<T> Done<T> {
    pub fn new(data: T, message: impl Into<String>) -> Self {
        Self {
            data,
            message: message.into(),
        }
    }
}
