use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::services::auth::hash_password;
use crate::services::jwt::Audience;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String, // SecretBox不要（Deserialize後すぐハッシュ化）
}

/// 登録・ログイン共通のレスポンス（セッション JWT）
#[derive(Debug, Serialize)]
pub struct AuthTokenResponse {
    pub token: String,
}

/// ユーザー登録ハンドラー
///
/// POST /api/register
///
/// # Security
/// - パスワードはログに出力しない
/// - パスワードは即座にハッシュ化
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<Json<AuthTokenResponse>, AppError> {
    // バリデーション
    validate_register_request(&request)?;

    // パスワードハッシュ化
    let password_hash = hash_password(&request.password)?;

    // ユーザー作成
    let user = state
        .user_repo
        .create_user(
            &request.first_name,
            &request.last_name,
            &request.email,
            &password_hash,
        )
        .await
        .map_err(|e| {
            // UNIQUE制約違反チェック
            if let sqlx::Error::Database(db_err) = &e
                && db_err.constraint() == Some("users_email_key")
            {
                return AppError::EmailAlreadyExists;
            }
            AppError::Database(e)
        })?;

    tracing::info!(user_id = user.user_id, "ユーザー登録成功");

    let token = state.jwt.generate(user.user_id, Audience::Auth).map_err(|e| {
        tracing::error!(error = ?e, "セッショントークン発行エラー");
        AppError::Internal(anyhow::anyhow!("token generation error"))
    })?;

    Ok(Json(AuthTokenResponse { token }))
}

/// 登録リクエストのバリデーション
fn validate_register_request(request: &RegisterRequest) -> Result<(), AppError> {
    if request.first_name.trim().is_empty() || request.last_name.trim().is_empty() {
        return Err(AppError::Validation("氏名は必須です".to_string()));
    }
    if request.email.trim().is_empty() {
        return Err(AppError::Validation("メールアドレスは必須です".to_string()));
    }
    if !request.email.contains('@') {
        return Err(AppError::Validation(
            "有効なメールアドレスを入力してください".to_string(),
        ));
    }
    if !check_password_strength(&request.password) {
        return Err(AppError::Validation(
            "パスワードは8文字以上で、英字と英字以外の文字を含めてください".to_string(),
        ));
    }
    Ok(())
}

/// パスワード強度の判定
///
/// 15文字以上ならそのまま許可。8〜14文字の場合は英字と英字以外の
/// 文字の両方を含むこと。
fn check_password_strength(password: &str) -> bool {
    let len = password.chars().count();
    if len >= 15 {
        true
    } else if len >= 8 {
        password.chars().any(|c| c.is_alphabetic())
            && password.chars().any(|c| !c.is_alphabetic())
    } else {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            first_name: "Hanako".to_string(),
            last_name: "Yamada".to_string(),
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn test_validate_empty_email() {
        let result = validate_register_request(&request("", "password123"));
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_invalid_email() {
        let result = validate_register_request(&request("invalid-email", "password123"));
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_empty_name() {
        let mut req = request("test@example.com", "password123");
        req.first_name = " ".to_string();
        assert!(validate_register_request(&req).is_err());
    }

    #[test]
    fn test_validate_valid_request() {
        let result = validate_register_request(&request("test@example.com", "password123"));
        assert!(result.is_ok());
    }

    #[test]
    fn test_password_strength_short() {
        assert!(!check_password_strength("short1"));
    }

    #[test]
    fn test_password_strength_medium_needs_mixed_chars() {
        // 8〜14文字: 英字のみ・数字のみは不可
        assert!(!check_password_strength("onlyletters"));
        assert!(!check_password_strength("12345678"));
        assert!(check_password_strength("letters123"));
    }

    #[test]
    fn test_password_strength_long_passphrase() {
        // 15文字以上は構成を問わない
        assert!(check_password_strength("correcthorsebatterystaple"));
    }
}
