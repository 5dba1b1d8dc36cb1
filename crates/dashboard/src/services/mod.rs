//! Application services.

pub mod flash;
pub mod profiles;
pub mod session;
