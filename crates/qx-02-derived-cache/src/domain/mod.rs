//! Cache domain: keys, expiry policy and errors.

pub mod errors;
pub mod keys;
pub mod policy;
