//! Engine key scheme.
//!
//! Every entity kind lives under its own prefix so that secrets, users and
//! rate-limit counters can share one keyspace without colliding.

pub const SECRET_PREFIX: &str = "secret:";
pub const USER_PREFIX: &str = "user:";
pub const RATE_LIMIT_PREFIX: &str = "rate_limit:";

pub fn secret_key(id: &str) -> String {
    format!("{SECRET_PREFIX}{id}")
}

pub fn user_key(username: &str) -> String {
    format!("{USER_PREFIX}{username}")
}

pub fn rate_limit_key(client: &str) -> String {
    format!("{RATE_LIMIT_PREFIX}{client}")
}
