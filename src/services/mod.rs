//! Request-level operations shared by the HTTP handlers.
//!
//! Handlers decode the request and run the endpoint-level permission check;
//! the functions here validate, enforce object-level permissions and talk to
//! the stores.

pub mod accounts;
pub mod catalog;
pub mod reviews;
