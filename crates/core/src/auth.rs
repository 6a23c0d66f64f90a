//! Bearer-token verification.
//!
//! Tokens are issued by the external Auth service and signed with a shared
//! HS256 secret. This service only verifies them and reads the user context.

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Claims carried by Auth service tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_superuser: bool,
}

fn default_true() -> bool {
    true
}

/// The authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub user_id: Uuid,
    pub email: String,
    pub roles: Vec<String>,
    pub is_active: bool,
    pub is_superuser: bool,
}

impl CurrentUser {
    /// True when the user owns the resource or is a superuser.
    pub fn can_manage(&self, owner: Option<Uuid>) -> bool {
        self.is_superuser || owner == Some(self.user_id)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("invalid token: {0}")]
    Invalid(#[from] jsonwebtoken::errors::Error),
    #[error("token subject is not a valid user id")]
    BadSubject,
}

/// Verifies HS256 tokens against the shared secret.
#[derive(Clone)]
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    pub fn verify(&self, token: &str) -> Result<CurrentUser, TokenError> {
        let data = decode::<Claims>(token, &self.key, &self.validation)?;
        let claims = data.claims;
        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| TokenError::BadSubject)?;
        Ok(CurrentUser {
            user_id,
            email: claims.email.unwrap_or_default(),
            roles: claims.roles,
            is_active: claims.is_active,
            is_superuser: claims.is_superuser,
        })
    }
}

impl std::fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenVerifier").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &str = "test-secret";

    fn token(claims: &Claims, secret: &str) -> String {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn claims(sub: &str) -> Claims {
        Claims {
            sub: sub.to_string(),
            exp: (chrono::Utc::now().timestamp() + 3600) as usize,
            email: Some("writer@example.org".into()),
            roles: vec!["editor".into()],
            is_active: true,
            is_superuser: false,
        }
    }

    #[test]
    fn verifies_valid_token() {
        let id = Uuid::new_v4();
        let user = TokenVerifier::new(SECRET)
            .verify(&token(&claims(&id.to_string()), SECRET))
            .unwrap();
        assert_eq!(user.user_id, id);
        assert_eq!(user.roles, vec!["editor"]);
        assert!(user.can_manage(Some(id)));
        assert!(!user.can_manage(Some(Uuid::new_v4())));
        assert!(!user.can_manage(None));
    }

    #[test]
    fn rejects_wrong_secret() {
        let tok = token(&claims(&Uuid::new_v4().to_string()), "other");
        assert!(matches!(
            TokenVerifier::new(SECRET).verify(&tok),
            Err(TokenError::Invalid(_))
        ));
    }

    #[test]
    fn rejects_non_uuid_subject() {
        let tok = token(&claims("not-a-uuid"), SECRET);
        assert!(matches!(
            TokenVerifier::new(SECRET).verify(&tok),
            Err(TokenError::BadSubject)
        ));
    }

    #[test]
    fn rejects_expired_token() {
        let mut c = claims(&Uuid::new_v4().to_string());
        c.exp = 1_000;
        assert!(TokenVerifier::new(SECRET).verify(&token(&c, SECRET)).is_err());
    }
}
