/// Election service configuration loaded from environment variables.
/// Every value has a default so a bare `election` binary runs a local
/// polling station out of the box.
#[derive(Debug)]
pub struct ElectionConfig {
    /// TCP port to listen on (default 3180). Env var: `ELECTION_PORT`.
    pub port: u16,
    /// Committee login for the admin endpoints. Env vars: `ADMIN_USER`,
    /// `ADMIN_PASS`. A shared secret checked per request, nothing more.
    pub admin_user: String,
    pub admin_pass: String,
    /// Whether voting is permitted while no window is configured
    /// (default: no). Env var: `OPEN_WHEN_UNSCHEDULED`.
    pub open_when_unscheduled: bool,
}

impl ElectionConfig {
    pub fn from_env() -> Self {
        Self {
            port: std::env::var("ELECTION_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3180),
            admin_user: std::env::var("ADMIN_USER").unwrap_or_else(|_| "admin".to_owned()),
            admin_pass: std::env::var("ADMIN_PASS").unwrap_or_else(|_| "kamujahat".to_owned()),
            open_when_unscheduled: std::env::var("OPEN_WHEN_UNSCHEDULED")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        }
    }
}
