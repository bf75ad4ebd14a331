//! Spotify 委任トークンのライフサイクル管理
//!
//! ルーム操作は必ずここを経由してオーナーのアクセストークンを取得する。
//! 1回のレゾリューションで行うネットワーク呼び出しは最大1回
//! （リフレッシュのみ）で、リトライは行わない。
//!
//! 同一ユーザーに対する並行レゾリューションはロックしない。期限切れ
//! トークンに対して複数のリフレッシュが同時に走り得るが、ストアの
//! upsert が last-write-wins で吸収する。ネットワーク呼び出し中に
//! ストアのロックを保持しないことを優先した意図的な仕様。

use std::future::Future;

use time::{Duration, OffsetDateTime};

use crate::models::{SpotifyToken, SpotifyTokenUpsert};
use crate::services::spotify::{SpotifyApiError, TokenGrant};

/// 期限判定の安全マージン（デフォルト60秒）
///
/// 判定から実際の API 使用までの間にトークンが失効するのを防ぐ。
pub const DEFAULT_REFRESH_SAFETY_MARGIN: Duration = Duration::seconds(60);

/// access_token が期限切れかどうかを判定
///
/// `expires_at = created_at + duration_seconds - safety_margin` とし、
/// `expires_at <= now` なら期限切れ。純粋関数（クロックは注入）。
pub fn is_expired(token: &SpotifyToken, now: OffsetDateTime, safety_margin: Duration) -> bool {
    let expires_at =
        token.created_at + Duration::seconds(token.duration_seconds) - safety_margin;
    expires_at <= now
}

/// トークンレゾリューションの失敗理由
///
/// 低レベルのエラー（ネットワーク・ストレージ）をこの4種に正規化する
/// 唯一の変換境界。上位層は生のエラー型で分岐しないこと。
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// トークン行が存在しない。認可コードフローの開始が必要
    #[error("user has not authorized with Spotify")]
    NotAuthorized,

    /// トークン行はあるが使える access_token も refresh_token もない。
    /// サイレント更新は不可能で、再認可が必要
    #[error("stored Spotify credential can no longer be renewed")]
    ReauthRequired,

    /// リフレッシュ中に認可サーバーがエラーを返した（非2xx・通信失敗・
    /// 不正なペイロード）
    #[error("Spotify token refresh failed")]
    Upstream(#[source] SpotifyApiError),

    /// トークン行の読み書きに失敗した
    #[error("failed to read or write stored Spotify credential")]
    Storage(#[source] sqlx::Error),
}

/// トークン行のストア
///
/// PostgreSQL 実装は `SpotifyTokenRepository`。テストではインメモリの
/// フェイクに差し替える。
pub trait TokenStore {
    fn get_token_by_user(
        &self,
        user_id: i64,
    ) -> impl Future<Output = Result<Option<SpotifyToken>, sqlx::Error>> + Send;

    fn upsert_token(
        &self,
        upsert: &SpotifyTokenUpsert,
    ) -> impl Future<Output = Result<(), sqlx::Error>> + Send;
}

/// リフレッシュ操作の窓口（実装は `SpotifyClient`）
pub trait TokenRefresher {
    fn refresh_tokens(
        &self,
        refresh_token: &str,
    ) -> impl Future<Output = Result<TokenGrant, SpotifyApiError>> + Send;
}

/// トークンレゾルバ
///
/// ローカルユーザーIDから現在有効なアクセストークンを取得する。
/// 必要ならリフレッシュして保存する。古いトークンをストアに残したまま
/// 返すことはない。
#[derive(Clone)]
pub struct TokenResolver<S, A> {
    store: S,
    api: A,
    safety_margin: Duration,
}

impl<S: TokenStore, A: TokenRefresher> TokenResolver<S, A> {
    pub fn new(store: S, api: A, safety_margin: Duration) -> Self {
        Self {
            store,
            api,
            safety_margin,
        }
    }

    /// 現在有効なアクセストークンを取得
    pub async fn resolve(&self, user_id: i64) -> Result<String, ResolveError> {
        self.resolve_at(user_id, OffsetDateTime::now_utc()).await
    }

    /// クロック注入版（テスト用に now を外から渡す）
    async fn resolve_at(&self, user_id: i64, now: OffsetDateTime) -> Result<String, ResolveError> {
        let token = self
            .store
            .get_token_by_user(user_id)
            .await
            .map_err(ResolveError::Storage)?;

        let Some(token) = token else {
            tracing::debug!(user_id, "Spotify トークン未登録");
            return Err(ResolveError::NotAuthorized);
        };

        if token.access_token.is_none() && token.refresh_token.is_none() {
            tracing::debug!(user_id, "Spotify トークン行はあるが両トークンとも無い");
            return Err(ResolveError::ReauthRequired);
        }

        // 期限内ならネットワークを触らずそのまま返す
        if let Some(access_token) = &token.access_token
            && !is_expired(&token, now, self.safety_margin)
        {
            return Ok(access_token.clone());
        }

        let Some(refresh_token) = token.refresh_token.clone() else {
            tracing::debug!(user_id, "access_token 期限切れ、refresh_token 無し");
            return Err(ResolveError::ReauthRequired);
        };

        tracing::debug!(user_id, "Spotify アクセストークンをリフレッシュ");
        let grant = self
            .api
            .refresh_tokens(&refresh_token)
            .await
            .map_err(ResolveError::Upstream)?;

        let Some(new_access_token) = grant.access_token else {
            // refresh_token がサイレントに無効化されたとみなす。
            // 元実装の挙動を踏襲し「未認可」と同じ扱いにする
            // （初回認可との区別は失われる。ストアには触らない）。
            tracing::warn!(user_id, "リフレッシュ成功レスポンスに access_token が無い");
            return Err(ResolveError::NotAuthorized);
        };

        // レスポンスに refresh_token が無ければ既存のものを使い続ける
        let upsert = SpotifyTokenUpsert {
            user_id: token.user_id,
            spotify_user_id: token.spotify_user_id,
            access_token: Some(new_access_token.clone()),
            refresh_token: grant.refresh_token.or(Some(refresh_token)),
            created_at: now,
            duration_seconds: grant.expires_in,
        };

        self.store
            .upsert_token(&upsert)
            .await
            .map_err(ResolveError::Storage)?;

        tracing::info!(user_id, "Spotify アクセストークンを更新・保存");
        Ok(new_access_token)
    }
}
