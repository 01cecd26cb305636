/// Fallback admin secret used when ADMIN_PASSWORD is unset. Known-insecure;
/// startup warns loudly when it is in effect.
pub const DEFAULT_ADMIN_PASSWORD: &str = "12345";

#[derive(Clone)]
pub struct Config {
    pub admin_password: String,
    pub admin_password_is_default: bool,
    pub host: String,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        dotenvy::dotenv().ok();

        let (admin_password, admin_password_is_default) = match std::env::var("ADMIN_PASSWORD") {
            Ok(v) if !v.is_empty() => (v, false),
            _ => (DEFAULT_ADMIN_PASSWORD.to_string(), true),
        };

        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .unwrap_or(8080);

        Ok(Self {
            admin_password,
            admin_password_is_default,
            host,
            port,
        })
    }
}
