use secrecy::SecretBox;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub database_url: SecretBox<String>,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,

    // Spotify API 設定
    pub spotify_client_id: String,
    pub spotify_client_secret: SecretBox<String>,
    /// 認可コードフローのコールバック URL
    pub spotify_redirect_uri: String,

    // セッション (JWT) 設定
    pub jwt_secret: SecretBox<String>,

    /// トークン期限判定の安全マージン（秒）
    #[serde(default = "default_token_refresh_margin_secs")]
    pub token_refresh_margin_secs: i64,
}

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_TOKEN_REFRESH_MARGIN_SECS: i64 = 60;

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_token_refresh_margin_secs() -> i64 {
    DEFAULT_TOKEN_REFRESH_MARGIN_SECS
}

impl Config {
    pub fn load() -> Result<Self, envy::Error> {
        envy::from_env()
    }
}
