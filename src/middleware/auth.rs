//! セッション JWT 認証ミドルウェア

use axum::{
    extract::{Request, State},
    http::{StatusCode, header},
    middleware::Next,
    response::Response,
};

use crate::services::jwt::Audience;
use crate::state::AppState;

/// JWT から取り出した認証済みユーザー
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub user_id: i64,
}

/// 有効なセッション JWT を要求するミドルウェア
///
/// `Authorization: Bearer <token>` ヘッダーの auth オーディエンス JWT を
/// 検証し、`AuthUser` を request extension に挿入する。
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = match auth_header {
        Some(h) if h.starts_with("Bearer ") => &h[7..],
        _ => return Err(StatusCode::UNAUTHORIZED),
    };

    let user_id = state
        .jwt
        .verify(token, Audience::Auth)
        .map_err(|_| StatusCode::UNAUTHORIZED)?;

    request.extensions_mut().insert(AuthUser { user_id });

    Ok(next.run(request).await)
}
