use sqlx::FromRow;
use time::OffsetDateTime;

/// ローカルユーザー1人分の Spotify 委任トークン
///
/// `access_token` と `refresh_token` の両方が NULL の行は
/// 「再認可が必要」を意味する（行の不在は「未認可」）。
/// トークン文字列はログ・レスポンスに出力しないこと。
#[derive(Debug, Clone, FromRow)]
pub struct SpotifyToken {
    pub token_id: i64,
    pub user_id: i64,
    /// Spotify 側の安定したユーザーID（upsert のキー）
    pub spotify_user_id: String,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    /// 現在の access_token を取得した時刻
    pub created_at: OffsetDateTime,
    /// access_token の有効期間（秒）
    pub duration_seconds: i64,
}

/// upsert する値のセット（token_id は DB 採番のため持たない）
#[derive(Debug, Clone)]
pub struct SpotifyTokenUpsert {
    pub user_id: i64,
    pub spotify_user_id: String,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub created_at: OffsetDateTime,
    pub duration_seconds: i64,
}
