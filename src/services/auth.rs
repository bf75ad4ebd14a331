use argon2::password_hash::SaltString;
use argon2::password_hash::rand_core::OsRng;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};

use crate::error::AppError;
use crate::models::User;
use crate::repositories::UserRepository;

/// タイミング攻撃対策用のダミーハッシュ
///
/// ユーザー不在時にも実際の argon2 検証と同じ計算を走らせるため、
/// `Argon2::default()` と同一パラメータ・フルサイズの出力を持つ
/// パース可能なハッシュを使う。
const DUMMY_PASSWORD_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHQ$lZzDJLtBfLNI3mlMhRM9b1CD2RmDbp3Ju4yhNwQe0ZM";

/// パスワードをargon2idでハッシュ化
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| {
            tracing::error!(error = ?e, "パスワードハッシュ生成エラー");
            AppError::Internal(anyhow::anyhow!("password hash error"))
        })?;
    Ok(hash.to_string())
}

/// 認証サービス
#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
}

impl AuthService {
    /// 新しい AuthService を作成
    pub fn new(user_repo: UserRepository) -> Self {
        Self { user_repo }
    }

    /// ユーザー認証を実行
    ///
    /// タイミング攻撃対策: ユーザーが存在しない場合もダミーのパスワード検証を実行
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<User, AppError> {
        let user = self.user_repo.find_by_email(email).await?;

        match user {
            Some(user) => {
                if self.verify_password(password, &user.password_hash)? {
                    tracing::info!(user_id = user.user_id, "認証成功");
                    Ok(user)
                } else {
                    tracing::warn!(user_id = user.user_id, "認証失敗: パスワード不一致");
                    Err(AppError::Authentication("invalid_credentials".to_string()))
                }
            }
            None => {
                // タイミング攻撃対策: ユーザーが存在しない場合もダミーのパスワード検証を実行
                // これにより、ユーザーの存在有無を応答時間から推測できなくなる
                let _ = self.verify_password(password, DUMMY_PASSWORD_HASH);
                tracing::warn!("認証失敗: ユーザー不在");
                Err(AppError::Authentication("invalid_credentials".to_string()))
            }
        }
    }

    /// パスワードを検証
    fn verify_password(&self, password: &str, hash: &str) -> Result<bool, AppError> {
        let parsed_hash = PasswordHash::new(hash).map_err(|e| {
            tracing::error!(error = ?e, "パスワードハッシュのパースエラー");
            AppError::Internal(anyhow::anyhow!("password hash parse error"))
        })?;

        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_password_roundtrip() {
        let hash = hash_password("correct horse battery staple").unwrap();
        let parsed = PasswordHash::new(&hash).unwrap();
        assert!(
            Argon2::default()
                .verify_password(b"correct horse battery staple", &parsed)
                .is_ok()
        );
        assert!(
            Argon2::default()
                .verify_password(b"wrong password", &parsed)
                .is_err()
        );
    }

    #[test]
    fn test_invalid_hash_format_is_rejected() {
        let invalid_hash = "invalid_hash_format";
        let parsed = PasswordHash::new(invalid_hash);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_dummy_hash_runs_full_verification() {
        // ダミーハッシュがパース不能だと検証が早期 return してしまい、
        // ユーザー不在時の応答時間が短くなる。パース可能であること、
        // かつ検証が（不一致で）最後まで実行されることを確認する。
        let parsed = PasswordHash::new(DUMMY_PASSWORD_HASH).unwrap();
        let result = Argon2::default().verify_password(b"any password", &parsed);
        assert!(matches!(
            result.unwrap_err(),
            argon2::password_hash::Error::Password
        ));
    }
}
