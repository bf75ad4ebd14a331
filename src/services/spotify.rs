use std::sync::Arc;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use http::StatusCode;
use serde::Deserialize;

use crate::error::AppError;
use crate::services::token::TokenRefresher;

/// Spotify API URLs
const SPOTIFY_AUTHORIZE_URL: &str = "https://accounts.spotify.com/authorize";
const SPOTIFY_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
const SPOTIFY_ME_URL: &str = "https://api.spotify.com/v1/me";
const SPOTIFY_QUEUE_URL: &str = "https://api.spotify.com/v1/me/player/queue";

/// 認可時に要求するスコープ
pub const REQUIRED_SCOPES: &str = "user-read-private user-read-email user-modify-playback-state";

/// Spotify API のエラー
///
/// 上流のステータスをそのまま保持する。リトライ・バックオフは行わない
/// （呼び出し側がレゾリューション単位で判断する）。
#[derive(Debug, thiserror::Error)]
pub enum SpotifyApiError {
    /// 通信エラーまたはレスポンスのパースエラー
    #[error("Spotify API request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// 上流が非 2xx を返した
    #[error("Spotify API returned status {status}")]
    Status { status: StatusCode, body: String },
}

/// トークンエンドポイントからのレスポンス
///
/// リフレッシュ時は access_token / refresh_token が省略されることがある。
#[derive(Debug, Deserialize)]
pub struct TokenGrant {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    /// access_token の有効期間（秒）
    pub expires_in: i64,
}

/// /v1/me からのレスポンス
#[derive(Debug, Deserialize)]
pub struct SpotifyUserProfile {
    /// Spotify 側の安定したユーザーID
    pub id: String,
    pub display_name: Option<String>,
}

/// Spotify 認可サーバー・リソースサーバーのクライアント
///
/// # Security
/// - client_secret はログに出力しない
/// - access_token / refresh_token もログに出力しない
#[derive(Clone)]
pub struct SpotifyClient {
    client_id: String,
    /// クライアントシークレット（機密情報 - ログ出力禁止）
    client_secret: Arc<String>,
    redirect_uri: String,
    http_client: reqwest::Client,
}

impl SpotifyClient {
    /// 新しい SpotifyClient を作成
    pub fn new(client_id: String, client_secret: String, redirect_uri: String) -> Self {
        Self {
            client_id,
            client_secret: Arc::new(client_secret),
            redirect_uri,
            http_client: reqwest::Client::new(),
        }
    }

    /// Spotify 認可 URL を生成
    ///
    /// `state` には api オーディエンスの JWT を渡し、コールバックで
    /// ユーザーを復元する。
    pub fn authorize_url(&self, state: &str) -> Result<String, AppError> {
        let params = [
            ("response_type", "code"),
            ("client_id", self.client_id.as_str()),
            ("scope", REQUIRED_SCOPES),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("state", state),
        ];

        let url = reqwest::Url::parse_with_params(SPOTIFY_AUTHORIZE_URL, &params).map_err(|e| {
            tracing::error!(error = ?e, "Spotify 認可 URL 生成エラー");
            AppError::Internal(anyhow::anyhow!("failed to build authorize url"))
        })?;

        Ok(url.to_string())
    }

    /// 認可コードをトークンペアに交換
    pub async fn exchange_code(&self, code: &str) -> Result<TokenGrant, SpotifyApiError> {
        // application/x-www-form-urlencoded 形式で body を構築
        let body = format!(
            "grant_type=authorization_code&code={}&redirect_uri={}&client_id={}&client_secret={}",
            urlencoding::encode(code),
            urlencoding::encode(&self.redirect_uri),
            urlencoding::encode(&self.client_id),
            urlencoding::encode(self.client_secret.as_str()),
        );

        let response = self
            .http_client
            .post(SPOTIFY_TOKEN_URL)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await?;

        let response = Self::error_for_status(response).await?;
        Ok(response.json::<TokenGrant>().await?)
    }

    /// アクセストークンで Spotify ユーザー情報を取得
    pub async fn current_user(
        &self,
        access_token: &str,
    ) -> Result<SpotifyUserProfile, SpotifyApiError> {
        let response = self
            .http_client
            .get(SPOTIFY_ME_URL)
            .bearer_auth(access_token)
            .send()
            .await?;

        let response = Self::error_for_status(response).await?;
        Ok(response.json::<SpotifyUserProfile>().await?)
    }

    /// ルームオーナーの再生キューにトラックを追加
    pub async fn enqueue_track(
        &self,
        access_token: &str,
        track_uri: &str,
    ) -> Result<(), SpotifyApiError> {
        let response = self
            .http_client
            .post(SPOTIFY_QUEUE_URL)
            .bearer_auth(access_token)
            .query(&[("uri", track_uri)])
            .json(&serde_json::json!({}))
            .send()
            .await?;

        Self::error_for_status(response).await?;
        Ok(())
    }

    /// Basic 認証ヘッダー値（base64 "client_id:client_secret"）
    fn client_auth_header(&self) -> String {
        let details = format!("{}:{}", self.client_id, self.client_secret);
        format!("Basic {}", STANDARD.encode(details))
    }

    /// 非 2xx レスポンスを `SpotifyApiError::Status` に変換
    async fn error_for_status(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, SpotifyApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        tracing::warn!(status = %status, "Spotify API エラーレスポンス");
        Err(SpotifyApiError::Status { status, body })
    }
}

impl TokenRefresher for SpotifyClient {
    /// リフレッシュトークンで新しいトークンペアを取得
    ///
    /// 元実装と同じく Basic 認証ヘッダーでクライアントを認証する。
    async fn refresh_tokens(&self, refresh_token: &str) -> Result<TokenGrant, SpotifyApiError> {
        let response = self
            .http_client
            .post(SPOTIFY_TOKEN_URL)
            .header("Authorization", self.client_auth_header())
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
            ])
            .send()
            .await?;

        let response = Self::error_for_status(response).await?;
        Ok(response.json::<TokenGrant>().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authorize_url_contains_required_params() {
        let client = SpotifyClient::new(
            "client123".to_string(),
            "secret456".to_string(),
            "https://example.com/callback".to_string(),
        );

        let url = client.authorize_url("state-jwt").unwrap();

        assert!(url.starts_with("https://accounts.spotify.com/authorize?"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("client_id=client123"));
        assert!(url.contains("state=state-jwt"));
        // スコープは URL エンコードされる
        assert!(url.contains("user-modify-playback-state"));
        // シークレットは認可 URL に含めない
        assert!(!url.contains("secret456"));
    }

    #[test]
    fn test_client_auth_header_is_base64_of_credentials() {
        let client = SpotifyClient::new(
            "id".to_string(),
            "secret".to_string(),
            "https://example.com/callback".to_string(),
        );

        // base64("id:secret")
        assert_eq!(client.client_auth_header(), "Basic aWQ6c2VjcmV0");
    }

    #[test]
    fn test_token_grant_tolerates_missing_tokens() {
        // リフレッシュレスポンスに access_token / refresh_token が無くてもパースできる
        let grant: TokenGrant = serde_json::from_str(r#"{"expires_in": 3600}"#).unwrap();
        assert!(grant.access_token.is_none());
        assert!(grant.refresh_token.is_none());
        assert_eq!(grant.expires_in, 3600);
    }
}
