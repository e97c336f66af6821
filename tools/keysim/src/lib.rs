//! keysim - keybed firmware simulator library
//!
//! This library exposes the internal modules for testing purposes.

pub mod script;
pub mod sim;
