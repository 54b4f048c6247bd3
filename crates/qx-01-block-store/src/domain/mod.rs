//! Block store domain: error taxonomy and the key-value record layout.

pub mod errors;
pub mod keys;
