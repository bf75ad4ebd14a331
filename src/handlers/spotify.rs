//! Spotify アカウント連携ハンドラー
//!
//! 認可コードフロー: `/api/spotify/auth` がユーザーを Spotify の認可画面へ
//! リダイレクトし、`/api/spotify/callback` がコードをトークンに交換して
//! 保存する。
//!
//! # Security
//! - state パラメータは api オーディエンスの署名付き JWT
//!   （コールバックはログイン不要のため、state からユーザーを復元する）
//! - access_token / refresh_token はログに出力しない

use axum::{
    Extension, Json,
    extract::{Query, State},
    response::Redirect,
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::AppError;
use crate::middleware::AuthUser;
use crate::models::SpotifyTokenUpsert;
use crate::services::jwt::Audience;
use crate::services::token::TokenStore;
use crate::state::AppState;

/// コールバック時のクエリパラメータ
///
/// ユーザーが認可を拒否した場合は `code` の代わりに `error` が付く。
#[derive(Debug, Deserialize)]
pub struct SpotifyCallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// コールバック成功レスポンス
#[derive(Debug, Serialize)]
pub struct SpotifyCallbackResponse {
    pub success: bool,
}

/// Spotify 認可フローを開始
///
/// GET /api/spotify/auth
///
/// ログイン中ユーザーの ID を署名付き state に埋め込み、
/// Spotify の認可画面へリダイレクトする。
pub async fn spotify_auth(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Redirect, AppError> {
    let state_token = state
        .jwt
        .generate(auth_user.user_id, Audience::Api)
        .map_err(|e| {
            tracing::error!(error = ?e, "state トークン発行エラー");
            AppError::Internal(anyhow::anyhow!("state token generation error"))
        })?;

    let redirect = state.spotify_client.authorize_url(&state_token)?;

    tracing::debug!(user_id = auth_user.user_id, "Spotify 認可画面へリダイレクト");
    Ok(Redirect::to(&redirect))
}

/// Spotify 認可コールバック処理
///
/// GET /api/spotify/callback
///
/// # 処理フロー
/// 1. `error` パラメータがあれば失敗（ユーザーが認可を拒否）
/// 2. state を検証してユーザーIDを復元
/// 3. code をトークンペアに交換
/// 4. access_token で Spotify ユーザーIDを取得
/// 5. トークン行を upsert（キー: spotify_user_id）
pub async fn spotify_callback(
    State(state): State<AppState>,
    Query(query): Query<SpotifyCallbackQuery>,
) -> Result<Json<SpotifyCallbackResponse>, AppError> {
    if query.error.is_some() {
        tracing::info!("Spotify 認可がユーザーに拒否された");
        return Err(AppError::SpotifyAuthRequired(
            "操作を続けるには Spotify アカウントへのアクセスを許可してください".to_string(),
        ));
    }

    let Some(state_token) = query.state.as_deref() else {
        return Err(AppError::Validation(
            "state クエリパラメータが必要です".to_string(),
        ));
    };

    let user_id = state
        .jwt
        .verify(state_token, Audience::Api)
        .map_err(|e| {
            tracing::debug!(error = ?e, "state の JWT 検証に失敗");
            AppError::Validation("Spotify コールバックの state が不正です".to_string())
        })?;

    let Some(code) = query.code.as_deref() else {
        return Err(AppError::SpotifyAuthRequired(
            "Spotify 認可に失敗しました。有効なコードが返されませんでした".to_string(),
        ));
    };

    // 3. code をトークンペアに交換
    let grant = state.spotify_client.exchange_code(code).await?;
    let created_at = OffsetDateTime::now_utc();

    let Some(access_token) = grant.access_token else {
        tracing::error!(user_id, "トークン交換レスポンスに access_token が無い");
        return Err(AppError::Internal(anyhow::anyhow!(
            "token exchange response missing access_token"
        )));
    };

    // 4. Spotify ユーザーIDを取得
    let profile = state.spotify_client.current_user(&access_token).await?;
    tracing::info!(user_id, "Spotify アカウント連携成功");

    // 5. トークン行を upsert
    state
        .token_repo
        .upsert_token(&SpotifyTokenUpsert {
            user_id,
            spotify_user_id: profile.id,
            access_token: Some(access_token),
            refresh_token: grant.refresh_token,
            created_at,
            duration_seconds: grant.expires_in,
        })
        .await
        .map_err(|e| {
            tracing::error!(error = ?e, user_id, "Spotify トークンの保存に失敗");
            AppError::Database(e)
        })?;

    Ok(Json(SpotifyCallbackResponse { success: true }))
}
