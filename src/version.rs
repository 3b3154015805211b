// Build-time identity from Cargo.toml

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Sent with every scrape so node operators can tell collector requests apart.
pub fn user_agent() -> String {
    format!("{}/{}", NAME, VERSION)
}
