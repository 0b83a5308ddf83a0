//! JWT による Identity Service 実装
//!
//! HS256 で署名されたセッショントークンを検証し、`username` クレームを取り出す。
//! 開発用に同じ鍵でトークンを発行する機能も持つ。

use chrono::{TimeDelta, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::domain::{IdentityError, IdentityService, Username};

/// JWT の設定
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// HMAC secret
    pub secret: String,
    /// 発行するトークンの有効期間
    pub token_ttl: TimeDelta,
}

/// JWT Claims
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// 有効期限 (Unix timestamp, seconds)
    pub exp: i64,
}

/// JWT Identity Service
#[derive(Clone)]
pub struct JwtIdentityService {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtIdentityService {
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp"]);
        validation.leeway = 0;

        Self {
            config,
            encoding_key,
            decoding_key,
            validation,
        }
    }

    /// トークンを発行する
    pub fn issue_token(&self, username: &Username) -> Result<String, IdentityError> {
        let exp = Utc::now() + self.config.token_ttl;
        let claims = Claims {
            username: Some(username.as_str().to_string()),
            exp: exp.timestamp(),
        };
        self.encode_claims(&claims)
    }

    /// 任意のクレームに署名する（テストや移行用）
    pub fn encode_claims(&self, claims: &Claims) -> Result<String, IdentityError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|err| IdentityError::IssueFailed(err.to_string()))
    }
}

impl IdentityService for JwtIdentityService {
    fn verify(&self, token: &str) -> Result<Username, IdentityError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|err| IdentityError::InvalidToken(err.to_string()))?;

        let username = claims
            .username
            .ok_or_else(|| IdentityError::InvalidToken("username not found".to_string()))?;

        Username::new(username).map_err(|err| IdentityError::InvalidToken(err.to_string()))
    }
}
