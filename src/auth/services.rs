use anyhow::Context;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{error, info, warn};

use crate::{
    auth::{
        claims::Identity,
        dto::{AuthResponse, LoginRequest, PublicUser, RegisterRequest},
        jwt::JwtKeys,
        password::{hash_password, verify_password},
        repo::{RepoError, UserRepo},
        repo_types::{NewUser, User},
    },
    error::AppError,
};

pub const MIN_PASSWORD_LEN: usize = 6;

/// Argon2id digest with default cost parameters that matches no password.
const DUMMY_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$dGltaW5nX2F0dGFja19wcmV2ZW50aW9u$K8rI5T7VdQ8xkO0GqK5K2w";

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub async fn register(
    users: &dyn UserRepo,
    keys: &JwtKeys,
    req: RegisterRequest,
) -> Result<AuthResponse, AppError> {
    let name = req.name.trim();
    let email = normalize_email(&req.email);

    if name.is_empty() {
        return Err(AppError::Validation("Name is required".into()));
    }
    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(AppError::Validation("Invalid email".into()));
    }
    if req.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    if users.find_by_email(&email).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(AppError::DuplicateAccount);
    }

    let password = req.password;
    let hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .context("hash task panicked")?
        .context("hash password")?;

    let user = users
        .create(NewUser {
            name,
            email: &email,
            password_hash: &hash,
        })
        .await
        .map_err(|e| match e {
            RepoError::DuplicateEmail => {
                warn!(email = %email, "email registered concurrently");
                AppError::DuplicateAccount
            }
            RepoError::Other(e) => AppError::Internal(e),
        })?;

    let token = issue_token(keys, &user)?;
    info!(user_id = %user.id, "user registered");
    Ok(AuthResponse {
        message: "User registered successfully",
        token,
        user: user.into(),
    })
}

pub async fn login(
    users: &dyn UserRepo,
    keys: &JwtKeys,
    req: LoginRequest,
) -> Result<AuthResponse, AppError> {
    let email = normalize_email(&req.email);
    if !is_valid_email(&email) {
        return Err(AppError::Validation("Invalid email".into()));
    }
    if req.password.is_empty() {
        return Err(AppError::Validation("Password is required".into()));
    }

    // Unknown emails are checked against a placeholder digest so both
    // failure paths pay for one Argon2 verification.
    let user = users.find_by_email(&email).await?;
    let password = req.password;
    let stored = user
        .as_ref()
        .map_or_else(|| DUMMY_HASH.to_string(), |u| u.password_hash.clone());
    let verified = tokio::task::spawn_blocking(move || verify_password(&password, &stored))
        .await
        .context("verify task panicked")?;

    let user = match (user, verified) {
        (Some(user), Ok(true)) => user,
        (Some(user), Ok(false)) => {
            warn!(user_id = %user.id, "login invalid password");
            return Err(AppError::InvalidCredentials);
        }
        (Some(user), Err(e)) => {
            error!(user_id = %user.id, "stored password hash is unreadable");
            return Err(AppError::Internal(e.into()));
        }
        (None, _) => {
            warn!(email = %email, "login unknown email");
            return Err(AppError::InvalidCredentials);
        }
    };

    let token = issue_token(keys, &user)?;
    info!(user_id = %user.id, "user logged in");
    Ok(AuthResponse {
        message: "Login successful",
        token,
        user: user.into(),
    })
}

pub async fn profile(users: &dyn UserRepo, identity: &Identity) -> Result<PublicUser, AppError> {
    match users.find_by_id(identity.user_id).await? {
        Some(user) => Ok(user.into()),
        None => {
            warn!(user_id = %identity.user_id, "token subject no longer exists");
            Err(AppError::NotFound("User"))
        }
    }
}

fn issue_token(keys: &JwtKeys, user: &User) -> Result<String, AppError> {
    keys.sign(user.id, &user.email)
        .context("sign token")
        .map_err(AppError::Internal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::repo::memory::MemoryUserRepo;
    use secrecy::SecretString;

    fn keys() -> JwtKeys {
        JwtKeys::new(&SecretString::new("test-secret".into()))
    }

    fn register_req(name: &str, email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            name: name.into(),
            email: email.into(),
            password: password.into(),
        }
    }

    fn login_req(email: &str, password: &str) -> LoginRequest {
        LoginRequest {
            email: email.into(),
            password: password.into(),
        }
    }

    #[test]
    fn email_shape_checks() {
        assert!(is_valid_email("ana@x.com"));
        assert!(!is_valid_email("ana@x"));
        assert!(!is_valid_email("ana x@x.com"));
        assert!(!is_valid_email(""));
    }

    #[tokio::test]
    async fn register_issues_token_for_new_user() {
        let repo = MemoryUserRepo::default();
        let keys = keys();
        let res = register(&repo, &keys, register_req(" Ana ", " Ana@X.com ", "secret1"))
            .await
            .expect("register");

        assert_eq!(res.user.name, "Ana");
        assert_eq!(res.user.email, "ana@x.com");
        let identity = keys.verify(&res.token).expect("token verifies");
        assert_eq!(identity.user_id, res.user.id);
        assert_eq!(identity.email, "ana@x.com");
    }

    #[tokio::test]
    async fn register_rejects_bad_input_before_storage() {
        let repo = MemoryUserRepo::default();
        let keys = keys();
        for req in [
            register_req("  ", "ana@x.com", "secret1"),
            register_req("Ana", "not-an-email", "secret1"),
            register_req("Ana", "ana@x.com", "12345"),
        ] {
            let err = register(&repo, &keys, req).await.unwrap_err();
            assert!(matches!(err, AppError::Validation(_)), "got {err:?}");
        }
        assert_eq!(repo.len(), 0);
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let repo = MemoryUserRepo::default();
        let keys = keys();
        register(&repo, &keys, register_req("Ana", "ana@x.com", "secret1"))
            .await
            .unwrap();
        let err = register(&repo, &keys, register_req("Other", "ANA@x.com", "secret2"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DuplicateAccount));
        assert_eq!(repo.len(), 1);
    }

    #[tokio::test]
    async fn storage_failure_is_internal() {
        let repo = MemoryUserRepo::default();
        repo.fail_writes();
        let err = register(&repo, &keys(), register_req("Ana", "ana@x.com", "secret1"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
    }

    #[tokio::test]
    async fn signing_failure_is_internal() {
        let repo = MemoryUserRepo::default();
        let no_secret = JwtKeys::new(&SecretString::new(String::new()));
        let err = register(&repo, &no_secret, register_req("Ana", "ana@x.com", "secret1"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
    }

    #[tokio::test]
    async fn login_succeeds_with_right_password() {
        let repo = MemoryUserRepo::default();
        let keys = keys();
        let reg = register(&repo, &keys, register_req("Ana", "ana@x.com", "secret1"))
            .await
            .unwrap();
        let res = login(&repo, &keys, login_req("ana@x.com", "secret1"))
            .await
            .expect("login");
        assert_eq!(res.user, reg.user);
        assert!(keys.verify(&res.token).is_ok());
    }

    #[tokio::test]
    async fn unknown_email_and_wrong_password_look_the_same() {
        let repo = MemoryUserRepo::default();
        let keys = keys();
        register(&repo, &keys, register_req("Ana", "ana@x.com", "secret1"))
            .await
            .unwrap();

        let unknown = login(&repo, &keys, login_req("nobody@x.com", "secret1"))
            .await
            .unwrap_err();
        let wrong = login(&repo, &keys, login_req("ana@x.com", "wrong"))
            .await
            .unwrap_err();

        assert!(matches!(unknown, AppError::InvalidCredentials));
        assert!(matches!(wrong, AppError::InvalidCredentials));
        assert_eq!(unknown.user_message(), wrong.user_message());
    }

    #[test]
    fn dummy_hash_costs_a_full_verification() {
        let parsed = argon2::PasswordHash::new(DUMMY_HASH).expect("dummy hash parses");
        assert_eq!(parsed.algorithm.as_str(), "argon2id");
        let params = argon2::Params::try_from(&parsed).unwrap();
        assert_eq!(params.m_cost(), argon2::Params::DEFAULT_M_COST);
        assert_eq!(params.t_cost(), argon2::Params::DEFAULT_T_COST);
        assert!(!verify_password("secret1", DUMMY_HASH).expect("verify runs to completion"));
    }

    #[tokio::test]
    async fn unknown_email_takes_as_long_as_wrong_password() {
        use std::time::{Duration, Instant};

        let repo = MemoryUserRepo::default();
        let keys = keys();
        register(&repo, &keys, register_req("Ana", "ana@x.com", "secret1"))
            .await
            .unwrap();

        let mut unknown = Duration::ZERO;
        let mut wrong = Duration::ZERO;
        for _ in 0..3 {
            let start = Instant::now();
            login(&repo, &keys, login_req("nobody@x.com", "secret1"))
                .await
                .unwrap_err();
            unknown += start.elapsed();

            let start = Instant::now();
            login(&repo, &keys, login_req("ana@x.com", "wrong"))
                .await
                .unwrap_err();
            wrong += start.elapsed();
        }

        // Both paths run one Argon2 verify; a skipped verify is orders of magnitude faster.
        assert!(
            unknown * 5 >= wrong,
            "unknown email took {unknown:?}, wrong password took {wrong:?}"
        );
    }

    #[tokio::test]
    async fn profile_of_deleted_user_is_not_found() {
        let repo = MemoryUserRepo::default();
        let keys = keys();
        let reg = register(&repo, &keys, register_req("Ana", "ana@x.com", "secret1"))
            .await
            .unwrap();
        let identity = keys.verify(&reg.token).unwrap();

        let user = profile(&repo, &identity).await.unwrap();
        assert_eq!(user.name, "Ana");

        repo.soft_delete(reg.user.id);
        let err = profile(&repo, &identity).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound("User")));
    }
}
