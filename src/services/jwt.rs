use std::sync::Arc;

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

/// セッショントークンの有効期間（秒）
const TOKEN_DURATION_SECS: u64 = 24 * 60 * 60;

/// JWT のオーディエンス
///
/// `Auth` は API セッション用、`Api` は Spotify 認可フローの state
/// パラメータ用。用途を分けることで、state として発行したトークンを
/// セッションに流用されるのを防ぐ。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    Auth,
    Api,
}

impl Audience {
    fn as_str(self) -> &'static str {
        match self {
            Audience::Auth => "auth",
            Audience::Api => "api",
        }
    }
}

/// JWT クレーム
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    /// ローカルユーザーID（文字列）
    sub: String,
    aud: String,
    exp: u64,
    nbf: u64,
}

/// HS256 JWT の発行・検証サービス
#[derive(Clone)]
pub struct JwtService {
    encoding_key: Arc<EncodingKey>,
    decoding_key: Arc<DecodingKey>,
}

impl JwtService {
    /// 共有シークレットからサービスを作成
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding_key: Arc::new(EncodingKey::from_secret(secret)),
            decoding_key: Arc::new(DecodingKey::from_secret(secret)),
        }
    }

    /// ユーザーIDに対して JWT を発行
    pub fn generate(
        &self,
        user_id: i64,
        audience: Audience,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let now = jsonwebtoken::get_current_timestamp();

        let claims = Claims {
            sub: user_id.to_string(),
            aud: audience.as_str().to_string(),
            exp: now + TOKEN_DURATION_SECS,
            nbf: now,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
    }

    /// JWT を検証してユーザーIDを取り出す
    ///
    /// オーディエンスが一致しないトークンは拒否する。
    pub fn verify(
        &self,
        token: &str,
        expected_audience: Audience,
    ) -> Result<i64, jsonwebtoken::errors::Error> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[expected_audience.as_str()]);
        validation.set_required_spec_claims(&["exp", "aud", "sub"]);

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation)?;

        token_data.claims.sub.parse::<i64>().map_err(|_| {
            jsonwebtoken::errors::Error::from(jsonwebtoken::errors::ErrorKind::InvalidSubject)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> JwtService {
        JwtService::new(b"test-secret-key-for-unit-tests")
    }

    #[test]
    fn test_generate_and_verify_roundtrip() {
        let jwt = service();
        let token = jwt.generate(42, Audience::Auth).unwrap();
        let user_id = jwt.verify(&token, Audience::Auth).unwrap();
        assert_eq!(user_id, 42);
    }

    #[test]
    fn test_wrong_audience_is_rejected() {
        // state 用トークンはセッションとして使えない（逆も同様）
        let jwt = service();
        let token = jwt.generate(42, Audience::Api).unwrap();
        assert!(jwt.verify(&token, Audience::Auth).is_err());
        assert!(jwt.verify(&token, Audience::Api).is_ok());
    }

    #[test]
    fn test_garbage_token_is_rejected() {
        let jwt = service();
        assert!(jwt.verify("not-a-jwt", Audience::Auth).is_err());
    }

    #[test]
    fn test_token_signed_with_other_secret_is_rejected() {
        let token = JwtService::new(b"other-secret")
            .generate(42, Audience::Auth)
            .unwrap();
        assert!(service().verify(&token, Audience::Auth).is_err());
    }
}
