use axum::{Extension, Json, extract::State};

use crate::error::AppError;
use crate::middleware::AuthUser;
use crate::models::User;
use crate::state::AppState;

/// ログイン中ユーザーの情報を取得
///
/// GET /api/me
///
/// password_hash はモデル側の `#[serde(skip)]` でレスポンスから除外される。
pub async fn me(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<User>, AppError> {
    let user = state
        .user_repo
        .find_by_id(auth_user.user_id)
        .await?
        .ok_or_else(|| {
            // セッションは有効だがユーザー行が無い（削除済みなど）
            tracing::warn!(user_id = auth_user.user_id, "セッションに対応するユーザーが存在しない");
            AppError::NotFound("ユーザーが見つかりません".to_string())
        })?;

    Ok(Json(user))
}
