use redis::{AsyncCommands, aio::ConnectionManager};

#[derive(Clone)]
pub struct RedisClient {
    pub conn: ConnectionManager,
}

fn blacklist_key(jti: &str) -> String {
    format!("blacklist:{}", jti)
}

impl RedisClient {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }

    /// Mark a refresh token as permanently invalid.
    ///
    /// The entry only has to outlive the token itself, so it expires together with it.
    pub async fn blacklist_refresh_token(
        &self,
        jti: &str,
        expires_in_seconds: i64,
    ) -> redis::RedisResult<()> {
        let mut conn = self.conn.clone(); //ConnectionManager clone is cheap
        conn.set_ex(blacklist_key(jti), 1u8, expires_in_seconds.max(1) as u64)
            .await
    }

    pub async fn is_refresh_token_blacklisted(&self, jti: &str) -> redis::RedisResult<bool> {
        let mut conn = self.conn.clone();
        conn.exists(blacklist_key(jti)).await
    }
}

#[cfg(test)]
mod tests {
    use super::blacklist_key;

    #[test]
    fn keys_are_namespaced() {
        assert_eq!(blacklist_key("abc"), "blacklist:abc");
    }
}
