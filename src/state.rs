use crate::auth::{
    jwt::JwtKeys,
    repo::{PgUserRepo, UserRepo},
};
use crate::config::AppConfig;
use crate::db;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepo>,
    pub tokens: Arc<JwtKeys>,
}

impl AppState {
    pub async fn init(config: &AppConfig) -> anyhow::Result<Self> {
        let pool = db::connect(&config.database).await?;
        db::migrate(&pool).await?;

        Ok(Self::from_parts(
            Arc::new(PgUserRepo::new(pool)),
            Arc::new(JwtKeys::new(&config.jwt.secret)),
        ))
    }

    pub fn from_parts(users: Arc<dyn UserRepo>, tokens: Arc<JwtKeys>) -> Self {
        Self { users, tokens }
    }

    #[cfg(test)]
    pub fn fake() -> (Self, Arc<crate::auth::repo::memory::MemoryUserRepo>) {
        use crate::auth::repo::memory::MemoryUserRepo;
        use secrecy::SecretString;

        let users = Arc::new(MemoryUserRepo::default());
        let tokens = Arc::new(JwtKeys::new(&SecretString::new("test-secret".into())));
        (Self::from_parts(users.clone(), tokens), users)
    }
}
