use std::future::{ready, Ready};

use actix_web::dev::Payload;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{web, FromRequest, HttpRequest};
use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::identity::Caller;
use crate::errors::AppError;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing bearer token")]
    MissingToken,
    #[error("token expired")]
    Expired,
    #[error("invalid token: {0}")]
    Invalid(String),
    #[error("failed to sign token: {0}")]
    Signing(String),
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::Signing(msg) => AppError::Internal(msg),
            other => AppError::Unauthorized(other.to_string()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub name: String,
    pub is_admin: bool,
    pub iat: i64,
    pub exp: i64,
}

/// Issues and verifies the HS256 tokens that identify callers.
#[derive(Clone)]
pub struct JwtAuth {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_secs: i64,
}

impl JwtAuth {
    pub fn new(secret: &str, ttl_secs: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl_secs,
        }
    }

    pub fn issue(&self, caller: &Caller) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        self.sign(&Claims {
            sub: caller.id,
            name: caller.name.clone(),
            is_admin: caller.is_admin,
            iat: now,
            exp: now + self.ttl_secs,
        })
    }

    fn sign(&self, claims: &Claims) -> Result<String, AuthError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| AuthError::Signing(e.to_string()))
    }

    pub fn verify(&self, token: &str) -> Result<Caller, AuthError> {
        let validation = Validation::new(Algorithm::HS256);
        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => AuthError::Invalid(e.to_string()),
            }
        })?;

        Ok(Caller {
            id: data.claims.sub,
            name: data.claims.name,
            is_admin: data.claims.is_admin,
        })
    }
}

fn bearer_token(req: &HttpRequest) -> Result<&str, AuthError> {
    req.headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(AuthError::MissingToken)
}

/// Extractor for handlers that require a signed-in caller.
pub struct AuthenticatedCaller(pub Caller);

impl FromRequest for AuthenticatedCaller {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let result = match req.app_data::<web::Data<JwtAuth>>() {
            Some(auth) => bearer_token(req)
                .and_then(|token| auth.verify(token))
                .map(AuthenticatedCaller)
                .map_err(|e| {
                    log::warn!("Rejected request to {}: {}", req.path(), e);
                    AppError::from(e)
                }),
            None => Err(AppError::Internal(
                "JwtAuth is not registered as app data".to_string(),
            )),
        };
        ready(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    const SECRET: &str = "test-secret";

    fn caller(is_admin: bool) -> Caller {
        Caller {
            id: Uuid::new_v4(),
            name: "jane".to_string(),
            is_admin,
        }
    }

    async fn extract(req: TestRequest) -> Result<AuthenticatedCaller, AppError> {
        let (req, mut payload) = req.to_http_parts();
        AuthenticatedCaller::from_request(&req, &mut payload).await
    }

    #[test]
    fn issued_token_verifies_to_same_caller() {
        let auth = JwtAuth::new(SECRET, 3600);
        let original = caller(true);

        let token = auth.issue(&original).unwrap();
        let verified = auth.verify(&token).unwrap();

        assert_eq!(verified.id, original.id);
        assert_eq!(verified.name, "jane");
        assert!(verified.is_admin);
    }

    #[test]
    fn token_signed_with_other_secret_is_invalid() {
        let token = JwtAuth::new("other", 3600).issue(&caller(false)).unwrap();
        let err = JwtAuth::new(SECRET, 3600).verify(&token).unwrap_err();
        assert!(matches!(err, AuthError::Invalid(_)));
    }

    #[test]
    fn expired_token_is_rejected() {
        let auth = JwtAuth::new(SECRET, 3600);
        let now = Utc::now().timestamp();
        let token = auth
            .sign(&Claims {
                sub: Uuid::new_v4(),
                name: "old".to_string(),
                is_admin: false,
                iat: now - 7200,
                exp: now - 3600,
            })
            .unwrap();

        assert!(matches!(auth.verify(&token), Err(AuthError::Expired)));
    }

    #[actix_web::test]
    async fn extractor_accepts_bearer_token() {
        let auth = JwtAuth::new(SECRET, 3600);
        let user = caller(false);
        let token = auth.issue(&user).unwrap();

        let extracted = extract(
            TestRequest::default()
                .app_data(web::Data::new(auth))
                .insert_header((AUTHORIZATION, format!("Bearer {token}"))),
        )
        .await
        .unwrap();

        assert_eq!(extracted.0.id, user.id);
    }

    #[actix_web::test]
    async fn extractor_rejects_missing_header() {
        let err = extract(TestRequest::default().app_data(web::Data::new(JwtAuth::new(SECRET, 60))))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[actix_web::test]
    async fn extractor_rejects_garbage_token() {
        let err = extract(
            TestRequest::default()
                .app_data(web::Data::new(JwtAuth::new(SECRET, 60)))
                .insert_header((AUTHORIZATION, "Bearer not-a-jwt")),
        )
        .await
        .err()
        .unwrap();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[actix_web::test]
    async fn extractor_rejects_non_bearer_scheme() {
        let err = extract(
            TestRequest::default()
                .app_data(web::Data::new(JwtAuth::new(SECRET, 60)))
                .insert_header((AUTHORIZATION, "Basic dXNlcjpwYXNz")),
        )
        .await
        .err()
        .unwrap();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }
}
