pub mod ping;
pub mod rate_limit;
pub mod secret;
pub mod user;
