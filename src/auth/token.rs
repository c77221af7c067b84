// JWT token generation and validation service

use chrono::Utc;
use jsonwebtoken::{
    decode, decode_header, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde_json::Value;
use tracing::debug;

use crate::auth::{
    error::AuthError,
    models::{IdentityClaim, Role},
    ttl::MAX_TTL_SECONDS,
};
use crate::config::AuthConfig;

/// Sign a claim with the given secret (HS256)
///
/// Signing is deterministic: the same claim and secret always produce the
/// same token. An empty secret is a configuration error.
pub fn issue_token(claim: &IdentityClaim, secret: &str) -> Result<String, AuthError> {
    if secret.is_empty() {
        return Err(AuthError::ConfigurationError(
            "no signing secret configured".to_string(),
        ));
    }

    encode(
        &Header::new(Algorithm::HS256),
        claim,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AuthError::TokenGenerationError(e.to_string()))
}

/// Outcome of checking a decoded payload against the claim schema
#[derive(Debug, PartialEq)]
pub enum PayloadCheck {
    Valid(IdentityClaim),
    Invalid(String),
}

impl PayloadCheck {
    /// Validate a decoded payload before any field is trusted
    pub fn inspect(payload: &Value) -> Self {
        let Some(fields) = payload.as_object() else {
            return PayloadCheck::Invalid("payload is not an object".to_string());
        };

        let id = match fields.get("id").and_then(Value::as_i64) {
            Some(id) if id > 0 && id <= i64::from(i32::MAX) => id as i32,
            Some(_) => return PayloadCheck::Invalid("id must be a positive integer".to_string()),
            None => return PayloadCheck::Invalid("id is missing or not an integer".to_string()),
        };

        let role = match fields.get("role").and_then(Value::as_str) {
            Some(raw) => match raw.parse::<Role>() {
                Ok(role) => role,
                Err(_) => return PayloadCheck::Invalid(format!("unknown role '{}'", raw)),
            },
            None => return PayloadCheck::Invalid("role is missing".to_string()),
        };

        let email = match fields.get("email") {
            None | Some(Value::Null) => None,
            Some(Value::String(email)) => Some(email.clone()),
            Some(_) => return PayloadCheck::Invalid("email must be a string".to_string()),
        };

        let (Some(iat), Some(exp)) = (
            fields.get("iat").and_then(Value::as_i64),
            fields.get("exp").and_then(Value::as_i64),
        ) else {
            return PayloadCheck::Invalid("iat and exp must be integer timestamps".to_string());
        };

        PayloadCheck::Valid(IdentityClaim {
            id,
            email,
            role,
            iat,
            exp,
        })
    }
}

/// Token service for JWT operations
///
/// Built once at startup from [`AuthConfig`] and shared read-only between
/// requests.
pub struct TokenService {
    secret: String,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl_seconds: i64,
}

impl TokenService {
    /// Create a new TokenService, refusing an empty secret or a lifetime
    /// outside `1..=MAX_TTL_SECONDS`
    pub fn new(config: &AuthConfig) -> Result<Self, AuthError> {
        if config.jwt_secret.trim().is_empty() {
            return Err(AuthError::ConfigurationError(
                "JWT_SECRET must not be empty".to_string(),
            ));
        }
        if !(1..=MAX_TTL_SECONDS).contains(&config.token_ttl_seconds) {
            return Err(AuthError::ConfigurationError(format!(
                "token lifetime must be between 1 and {} seconds, got {}",
                MAX_TTL_SECONDS, config.token_ttl_seconds
            )));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Ok(Self {
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            secret: config.jwt_secret.clone(),
            validation,
            ttl_seconds: config.token_ttl_seconds,
        })
    }

    pub fn ttl_seconds(&self) -> i64 {
        self.ttl_seconds
    }

    /// Issue an access token for a user, valid for the configured lifetime
    pub fn issue(
        &self,
        user_id: i32,
        email: Option<&str>,
        role: Role,
    ) -> Result<(String, IdentityClaim), AuthError> {
        let iat = Utc::now().timestamp();
        let exp = iat.checked_add(self.ttl_seconds).ok_or_else(|| {
            AuthError::TokenGenerationError("token expiry overflows".to_string())
        })?;

        let claim = IdentityClaim {
            id: user_id,
            email: email.map(str::to_string),
            role,
            iat,
            exp,
        };

        let token = issue_token(&claim, &self.secret)?;
        debug!("Issued token for user {} ({}), expires at {}", user_id, role, exp);
        Ok((token, claim))
    }

    /// Verify signature and expiry, then check the payload schema
    pub fn verify(&self, token: &str) -> Result<IdentityClaim, AuthError> {
        // Header errors surface as Json too; they must stay InvalidToken
        decode_header(token).map_err(|_| AuthError::InvalidToken)?;

        let data = decode::<Value>(token, &self.decoding_key, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                ErrorKind::MissingRequiredClaim(claim) => {
                    AuthError::InvalidPayload(format!("missing required claim '{}'", claim))
                }
                ErrorKind::Json(_) => AuthError::InvalidPayload("payload is not a claim object".to_string()),
                _ => AuthError::InvalidToken,
            }
        })?;

        match PayloadCheck::inspect(&data.claims) {
            PayloadCheck::Valid(claim) => Ok(claim),
            PayloadCheck::Invalid(reason) => Err(AuthError::InvalidPayload(reason)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    const SECRET: &str = "test_secret_key_for_testing_purposes";

    fn config(secret: &str, ttl_seconds: i64) -> AuthConfig {
        AuthConfig {
            jwt_secret: secret.to_string(),
            token_ttl_seconds: ttl_seconds,
        }
    }

    // Helper to create a test token service
    fn test_token_service() -> TokenService {
        TokenService::new(&config(SECRET, 3600)).unwrap()
    }

    fn sign_raw(payload: &Value, secret: &str) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            payload,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn now() -> i64 {
        Utc::now().timestamp()
    }

    #[test]
    fn test_empty_secret_refuses_construction() {
        assert!(matches!(
            TokenService::new(&config("", 3600)),
            Err(AuthError::ConfigurationError(_))
        ));
        assert!(matches!(
            TokenService::new(&config("  ", 3600)),
            Err(AuthError::ConfigurationError(_))
        ));
    }

    #[test]
    fn test_out_of_range_lifetime_refuses_construction() {
        for ttl in [0, -1, MAX_TTL_SECONDS + 1, i64::MAX] {
            assert!(
                matches!(
                    TokenService::new(&config(SECRET, ttl)),
                    Err(AuthError::ConfigurationError(_))
                ),
                "ttl {}",
                ttl
            );
        }
    }

    #[test]
    fn test_longest_lifetime_still_issues() {
        let service = TokenService::new(&config(SECRET, MAX_TTL_SECONDS)).unwrap();
        let (token, claim) = service.issue(3, None, Role::Client).unwrap();
        assert_eq!(claim.exp - claim.iat, MAX_TTL_SECONDS);
        assert_eq!(service.verify(&token).unwrap(), claim);
    }

    #[test]
    fn test_issue_token_without_secret_is_configuration_error() {
        let claim = IdentityClaim {
            id: 1,
            email: None,
            role: Role::Client,
            iat: now(),
            exp: now() + 60,
        };
        assert!(matches!(
            issue_token(&claim, ""),
            Err(AuthError::ConfigurationError(_))
        ));
    }

    #[test]
    fn test_signing_is_deterministic() {
        let claim = IdentityClaim {
            id: 5,
            email: Some("a@b.com".to_string()),
            role: Role::Admin,
            iat: 1_700_000_000,
            exp: 1_700_003_600,
        };
        assert_eq!(
            issue_token(&claim, SECRET).unwrap(),
            issue_token(&claim, SECRET).unwrap()
        );
    }

    #[test]
    fn test_expiration_uses_configured_ttl() {
        let service = TokenService::new(&config(SECRET, 7200)).unwrap();
        let (token, issued) = service.issue(1, None, Role::Client).unwrap();
        assert_eq!(issued.exp - issued.iat, 7200);

        let verified = service.verify(&token).unwrap();
        assert_eq!(verified, issued);
    }

    #[test]
    fn test_token_claims_contain_user_identity() {
        let service = test_token_service();
        let (token, _) = service.issue(42, Some("user@example.com"), Role::Admin).unwrap();

        let claim = service.verify(&token).unwrap();
        assert_eq!(claim.id, 42);
        assert_eq!(claim.email.as_deref(), Some("user@example.com"));
        assert_eq!(claim.role, Role::Admin);
    }

    #[test]
    fn test_token_expires_after_ttl() {
        let service = TokenService::new(&config(SECRET, 1)).unwrap();
        let (token, _) = service.issue(1, None, Role::Client).unwrap();

        std::thread::sleep(std::time::Duration::from_secs(2));

        assert!(matches!(service.verify(&token), Err(AuthError::TokenExpired)));
    }

    #[test]
    fn test_expired_is_distinct_from_invalid() {
        let claim = IdentityClaim {
            id: 1,
            email: None,
            role: Role::Client,
            iat: now() - 1000,
            exp: now() - 500,
        };
        let token = issue_token(&claim, SECRET).unwrap();
        assert!(matches!(
            test_token_service().verify(&token),
            Err(AuthError::TokenExpired)
        ));
    }

    #[test]
    fn test_token_signature_verification() {
        let service1 = TokenService::new(&config("secret1", 3600)).unwrap();
        let service2 = TokenService::new(&config("secret2", 3600)).unwrap();

        let (token, _) = service1.issue(1, None, Role::Client).unwrap();

        assert!(service1.verify(&token).is_ok());
        assert!(matches!(service2.verify(&token), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_malformed_tokens_are_rejected() {
        let service = test_token_service();

        for token in [
            "",
            "not.a.token",
            "invalid_token_format",
            "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9.invalid.signature",
        ] {
            assert!(matches!(service.verify(token), Err(AuthError::InvalidToken)), "{}", token);
        }
    }

    #[test]
    fn test_tampered_payload_is_rejected() {
        let service = test_token_service();
        let (client_token, _) = service.issue(1, None, Role::Client).unwrap();
        let (admin_token, _) = service.issue(1, None, Role::Admin).unwrap();

        // Splice the admin payload onto the client signature
        let client: Vec<&str> = client_token.split('.').collect();
        let admin: Vec<&str> = admin_token.split('.').collect();
        let forged = format!("{}.{}.{}", client[0], admin[1], client[2]);

        assert!(matches!(service.verify(&forged), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_payload_with_unknown_role_is_invalid_payload() {
        let token = sign_raw(
            &json!({"id": 1, "role": "superuser", "iat": now(), "exp": now() + 60}),
            SECRET,
        );
        assert!(matches!(
            test_token_service().verify(&token),
            Err(AuthError::InvalidPayload(_))
        ));
    }

    #[test]
    fn test_payload_with_string_id_is_invalid_payload() {
        let token = sign_raw(
            &json!({"id": "1", "role": "client", "iat": now(), "exp": now() + 60}),
            SECRET,
        );
        assert!(matches!(
            test_token_service().verify(&token),
            Err(AuthError::InvalidPayload(_))
        ));
    }

    #[test]
    fn test_payload_without_exp_is_invalid_payload() {
        let token = sign_raw(&json!({"id": 1, "role": "client", "iat": now()}), SECRET);
        assert!(matches!(
            test_token_service().verify(&token),
            Err(AuthError::InvalidPayload(_))
        ));
    }

    #[test]
    fn test_inspect_accepts_well_formed_payload() {
        let check = PayloadCheck::inspect(&json!({
            "id": 9,
            "email": "x@y.com",
            "role": "admin",
            "iat": 10,
            "exp": 20
        }));
        assert_eq!(
            check,
            PayloadCheck::Valid(IdentityClaim {
                id: 9,
                email: Some("x@y.com".to_string()),
                role: Role::Admin,
                iat: 10,
                exp: 20,
            })
        );
    }

    #[test]
    fn test_inspect_rejects_bad_shapes() {
        let bad = [
            json!([1, 2, 3]),
            json!("admin"),
            json!({"role": "admin", "iat": 1, "exp": 2}),
            json!({"id": 0, "role": "admin", "iat": 1, "exp": 2}),
            json!({"id": -4, "role": "admin", "iat": 1, "exp": 2}),
            json!({"id": 1.5, "role": "admin", "iat": 1, "exp": 2}),
            json!({"id": 4_294_967_296i64, "role": "admin", "iat": 1, "exp": 2}),
            json!({"id": 1, "iat": 1, "exp": 2}),
            json!({"id": 1, "role": 1, "iat": 1, "exp": 2}),
            json!({"id": 1, "role": "client", "email": 5, "iat": 1, "exp": 2}),
            json!({"id": 1, "role": "client", "exp": 2}),
        ];

        for payload in bad {
            assert!(
                matches!(PayloadCheck::inspect(&payload), PayloadCheck::Invalid(_)),
                "{}",
                payload
            );
        }
    }

    fn any_role() -> impl Strategy<Value = Role> {
        prop_oneof![Just(Role::Client), Just(Role::Admin)]
    }

    proptest! {
        #[test]
        fn prop_verify_returns_issued_identity(
            user_id in 1i32..i32::MAX,
            role in any_role(),
            email in proptest::option::of("[a-z]{3,10}@[a-z]{3,10}\\.(com|org|net)")
        ) {
            let service = test_token_service();
            let (token, issued) = service.issue(user_id, email.as_deref(), role)?;
            let claim = service.verify(&token)?;

            prop_assert_eq!(claim.id, user_id);
            prop_assert_eq!(claim.role, role);
            prop_assert_eq!(claim, issued);
        }

        #[test]
        fn prop_foreign_secret_is_invalid_token(
            user_id in 1i32..1_000_000,
            other in "[a-zA-Z0-9]{8,32}"
        ) {
            prop_assume!(other != SECRET);
            let foreign = TokenService::new(&config(&other, 3600))?;
            let (token, _) = foreign.issue(user_id, None, Role::Admin)?;

            prop_assert!(matches!(test_token_service().verify(&token), Err(AuthError::InvalidToken)));
        }

        #[test]
        fn prop_malformed_tokens_rejected(malformed in "[a-zA-Z0-9]{10,50}") {
            prop_assert!(test_token_service().verify(&malformed).is_err());
        }
    }
}
