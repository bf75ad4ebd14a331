use sqlx::PgPool;

use crate::models::{SpotifyToken, SpotifyTokenUpsert};
use crate::services::token::TokenStore;

/// Spotify トークンの PostgreSQL 実装
///
/// upsert のキーは `spotify_user_id`。同じ Spotify アカウントを別の
/// ローカルユーザーがリンクし直すと、既存行の user_id ごと上書きされる
/// （元実装から引き継いだ仕様。意図的なアカウント再リンク動作として保存）。
#[derive(Clone)]
pub struct SpotifyTokenRepository {
    pool: PgPool,
}

impl SpotifyTokenRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl TokenStore for SpotifyTokenRepository {
    /// ローカルユーザーIDでトークン行を検索
    async fn get_token_by_user(&self, user_id: i64) -> Result<Option<SpotifyToken>, sqlx::Error> {
        sqlx::query_as::<_, SpotifyToken>(
            r#"
            SELECT token_id, user_id, spotify_user_id, access_token, refresh_token,
                   created_at, duration_seconds
            FROM spotify_tokens
            WHERE user_id = $1
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// トークン行を upsert（キー: spotify_user_id）
    async fn upsert_token(&self, upsert: &SpotifyTokenUpsert) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO spotify_tokens
                (user_id, spotify_user_id, access_token, refresh_token, created_at, duration_seconds)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (spotify_user_id) DO UPDATE SET
                user_id = EXCLUDED.user_id,
                access_token = EXCLUDED.access_token,
                refresh_token = EXCLUDED.refresh_token,
                created_at = EXCLUDED.created_at,
                duration_seconds = EXCLUDED.duration_seconds
            "#,
        )
        .bind(upsert.user_id)
        .bind(&upsert.spotify_user_id)
        .bind(&upsert.access_token)
        .bind(&upsert.refresh_token)
        .bind(upsert.created_at)
        .bind(upsert.duration_seconds)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
