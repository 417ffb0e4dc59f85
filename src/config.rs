#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub db_max_connections: u32,
    pub jwt_secret: String,
    pub jwt_maxage: i64,
    pub refresh_token_maxage: i64,
    pub redis_url: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
    pub media_root: String,
}

impl Config {
    pub fn init() -> Config {
        let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let jwt_secret = std::env::var("JWT_SECRET_KEY").expect("JWT_SECRET_KEY must be set");
        let jwt_maxage = std::env::var("JWT_MAXAGE").expect("JWT_MAXAGE must be set");
        let refresh_token_maxage =
            std::env::var("REFRESH_TOKEN_MAXAGE").expect("REFRESH_TOKEN_MAXAGE must be set");
        let redis_url = std::env::var("REDIS_URL").expect("REDIS_URL must be set");
        let cors_allowed_origins =
            std::env::var("CORS_ALLOWED_ORIGINS").expect("CORS_ALLOWED_ORIGINS must be set");
        let port = std::env::var("PORT").unwrap_or_else(|_| "8000".to_string());
        let media_root = std::env::var("MEDIA_ROOT").unwrap_or_else(|_| "./media".to_string());
        let db_max_connections =
            std::env::var("DB_MAX_CONNECTIONS").unwrap_or_else(|_| "10".to_string());

        Config {
            database_url,
            db_max_connections: db_max_connections
                .parse::<u32>()
                .expect("DB_MAX_CONNECTIONS must be a positive integer"),
            jwt_secret,
            jwt_maxage: jwt_maxage
                .parse::<i64>()
                .expect("JWT_MAXAGE must be a number of seconds"),
            refresh_token_maxage: refresh_token_maxage
                .parse::<i64>()
                .expect("REFRESH_TOKEN_MAXAGE must be a number of seconds"),
            redis_url,
            port: port.parse::<u16>().expect("PORT must be a valid port number"),
            cors_allowed_origins: parse_origins(&cors_allowed_origins),
            media_root,
        }
    }
}

/// Split a comma-separated origin list, dropping blanks and trailing slashes.
fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|origin| origin.trim().trim_end_matches('/'))
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::parse_origins;

    #[test]
    fn origins_are_trimmed() {
        let origins = parse_origins(" http://localhost:3000/, https://garden.example.com ,,");
        assert_eq!(
            origins,
            vec!["http://localhost:3000", "https://garden.example.com"]
        );
    }
}
