use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::services::spotify::SpotifyApiError;
use crate::services::token::ResolveError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("認証エラー: {0}")]
    Authentication(String),

    #[error("バリデーションエラー: {0}")]
    Validation(String),

    #[error("データベースエラー")]
    Database(#[from] sqlx::Error),

    #[error("Spotify API エラー")]
    SpotifyApi(#[from] SpotifyApiError),

    #[error("内部エラー")]
    Internal(#[from] anyhow::Error),

    #[error("このメールアドレスは既に使用されています")]
    EmailAlreadyExists,

    #[error("リソースが見つかりません: {0}")]
    NotFound(String),

    #[error("権限がありません: {0}")]
    Forbidden(String),

    #[error("Spotify 連携が必要です: {0}")]
    SpotifyAuthRequired(String),
}

/// トークンレゾルバの4種の失敗を HTTP 向けに変換する唯一の境界
///
/// NOT_AUTHORIZED / REAUTH_REQUIRED → 424、UPSTREAM / STORAGE → 5xx。
impl From<ResolveError> for AppError {
    fn from(e: ResolveError) -> Self {
        match e {
            ResolveError::NotAuthorized => AppError::SpotifyAuthRequired(
                "この操作には Spotify アカウントの連携が必要です".to_string(),
            ),
            ResolveError::ReauthRequired => AppError::SpotifyAuthRequired(
                "Spotify の認可が失効しています。再度連携してください".to_string(),
            ),
            ResolveError::Upstream(e) => AppError::SpotifyApi(e),
            ResolveError::Storage(e) => AppError::Database(e),
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::Authentication(_) => (
                StatusCode::UNAUTHORIZED,
                "メールアドレスまたはパスワードが正しくありません".to_string(),
            ),
            Self::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::Database(e) => {
                tracing::error!(error = ?e, "データベースエラー");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "内部エラーが発生しました".to_string(),
                )
            }
            Self::SpotifyApi(e) => {
                tracing::error!(error = ?e, "Spotify API通信エラー");
                (
                    StatusCode::BAD_GATEWAY,
                    "Spotify との通信に失敗しました。しばらくしてから再試行してください"
                        .to_string(),
                )
            }
            Self::Internal(e) => {
                tracing::error!(error = ?e, "内部エラー");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "内部エラーが発生しました".to_string(),
                )
            }
            Self::EmailAlreadyExists => (
                StatusCode::CONFLICT,
                "このメールアドレスは既に使用されています".to_string(),
            ),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            Self::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            Self::SpotifyAuthRequired(msg) => (StatusCode::FAILED_DEPENDENCY, msg.clone()),
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_error_mapping() {
        // 424 系
        assert!(matches!(
            AppError::from(ResolveError::NotAuthorized),
            AppError::SpotifyAuthRequired(_)
        ));
        assert!(matches!(
            AppError::from(ResolveError::ReauthRequired),
            AppError::SpotifyAuthRequired(_)
        ));
        // 5xx 系
        assert!(matches!(
            AppError::from(ResolveError::Storage(sqlx::Error::PoolClosed)),
            AppError::Database(_)
        ));
        assert!(matches!(
            AppError::from(ResolveError::Upstream(SpotifyApiError::Status {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                body: String::new(),
            })),
            AppError::SpotifyApi(_)
        ));
    }

    #[test]
    fn test_spotify_auth_required_maps_to_failed_dependency() {
        let response = AppError::from(ResolveError::NotAuthorized).into_response();
        assert_eq!(response.status(), StatusCode::FAILED_DEPENDENCY);
    }
}
