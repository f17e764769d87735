//! Account catalog models split into domain-specific modules.

pub mod account;
pub mod role;

pub use account::*;
pub use role::*;
