//! リスニングルームハンドラー
//!
//! ルームオーナーに代わって Spotify を操作する前に、必ずトークン
//! レゾルバでオーナーのアクセストークンを解決する。リクエストした
//! 本人とトークンの持ち主（オーナー）は別ユーザーであり得る。

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::middleware::AuthUser;
use crate::models::{Room, RoomSummary};
use crate::services::spotify::SpotifyApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateRoomRequest {
    pub room_name: String,
    /// 入室コード（省略可。設定すると join 時に一致が必要）
    pub room_code: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct JoinRoomRequest {
    pub room_code: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EnqueueRequest {
    /// Spotify トラック URI（例: spotify:track:...）
    pub uri: String,
}

#[derive(Debug, Serialize)]
pub struct RoomListResponse {
    pub rooms: Vec<RoomSummary>,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// ルーム作成ハンドラー
///
/// POST /api/rooms
///
/// Spotify と連携済みのユーザーのみルームを作成できる。
/// 連携確認を兼ねて先にトークンを解決する（未連携なら 424 が返る）。
pub async fn create_room(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(request): Json<CreateRoomRequest>,
) -> Result<Json<Room>, AppError> {
    validate_create_room_request(&request)?;

    state.token_resolver.resolve(auth_user.user_id).await?;

    let room = state
        .room_repo
        .create_room(
            auth_user.user_id,
            request.room_code.as_deref(),
            &request.room_name,
        )
        .await?;

    tracing::info!(room_id = room.room_id, user_id = auth_user.user_id, "ルーム作成");
    Ok(Json(room))
}

/// オーナーのアクティブなルームを取得
///
/// GET /api/rooms/owned
pub async fn get_owned_room(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<Room>, AppError> {
    let room = state
        .room_repo
        .find_active_by_owner(auth_user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("アクティブなルームがありません".to_string()))?;

    Ok(Json(room))
}

/// 参加中（またはオーナー）のルーム一覧を取得
///
/// GET /api/rooms
pub async fn get_joined_rooms(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<RoomListResponse>, AppError> {
    let rooms = state.room_repo.find_joined_by_user(auth_user.user_id).await?;
    Ok(Json(RoomListResponse { rooms }))
}

/// ルームに参加
///
/// PUT /api/rooms/{room_id}/join
///
/// ルームに入室コードが設定されている場合は一致が必要。
pub async fn join_room(
    State(state): State<AppState>,
    Path(room_id): Path<i64>,
    Extension(auth_user): Extension<AuthUser>,
    Json(request): Json<JoinRoomRequest>,
) -> Result<Json<SuccessResponse>, AppError> {
    let room = state
        .room_repo
        .find_by_id(room_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("ルーム {room_id} は存在しません")))?;

    if !room.active {
        return Err(AppError::Forbidden(format!(
            "ルーム {room_id} は既に終了しています"
        )));
    }

    if let Some(expected_code) = &room.room_code
        && request.room_code.as_deref() != Some(expected_code.as_str())
    {
        tracing::debug!(room_id, user_id = auth_user.user_id, "入室コード不一致");
        return Err(AppError::Forbidden("入室コードが正しくありません".to_string()));
    }

    state.room_repo.add_member(room_id, auth_user.user_id).await?;

    tracing::info!(room_id, user_id = auth_user.user_id, "ルーム参加");
    Ok(Json(SuccessResponse { success: true }))
}

/// ルームから退出
///
/// PUT /api/rooms/{room_id}/leave
pub async fn leave_room(
    State(state): State<AppState>,
    Path(room_id): Path<i64>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<SuccessResponse>, AppError> {
    state
        .room_repo
        .remove_member(room_id, auth_user.user_id)
        .await?;

    tracing::info!(room_id, user_id = auth_user.user_id, "ルーム退出");
    Ok(Json(SuccessResponse { success: true }))
}

/// ルームの再生キューにトラックを追加
///
/// PUT /api/rooms/{room_id}/queue
///
/// # 処理フロー
/// 1. ルームの存在・アクティブ・メンバーシップを確認
/// 2. **オーナーの**アクセストークンを解決（リクエスト者とは別人で
///    あり得る。必要ならここで透過的にリフレッシュされる）
/// 3. オーナーの再生キューにトラックを追加
pub async fn enqueue_track(
    State(state): State<AppState>,
    Path(room_id): Path<i64>,
    Extension(auth_user): Extension<AuthUser>,
    Json(request): Json<EnqueueRequest>,
) -> Result<Json<SuccessResponse>, AppError> {
    if request.uri.trim().is_empty() {
        return Err(AppError::Validation("トラック URI は必須です".to_string()));
    }

    let room = state
        .room_repo
        .find_by_id(room_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("ルーム {room_id} は存在しません")))?;

    let user_in_room = auth_user.user_id == room.owner_id
        || state.room_repo.is_member(room_id, auth_user.user_id).await?;

    if !user_in_room {
        return Err(AppError::Forbidden(format!(
            "ルーム {room_id} で再生する権限がありません"
        )));
    }
    if !room.active {
        return Err(AppError::Forbidden(format!(
            "ルーム {room_id} は既に終了しています"
        )));
    }

    tracing::debug!(
        room_id,
        owner_id = room.owner_id,
        requested_by = auth_user.user_id,
        "オーナーのトークンを解決してキュー追加"
    );
    let access_token = state.token_resolver.resolve(room.owner_id).await?;

    state
        .spotify_client
        .enqueue_track(&access_token, &request.uri)
        .await
        .map_err(|e| map_enqueue_error(e, room_id))?;

    Ok(Json(SuccessResponse { success: true }))
}

/// キュー追加時の Spotify エラーをユーザー向けに変換
///
/// 403 はプレミアム未加入、404 はトラック不在として扱う（元実装の挙動）。
fn map_enqueue_error(e: SpotifyApiError, room_id: i64) -> AppError {
    if let SpotifyApiError::Status { status, .. } = &e {
        if *status == StatusCode::FORBIDDEN {
            return AppError::Forbidden(
                "キューに追加できません: オーナーがプレミアム会員ではありません".to_string(),
            );
        }
        if *status == StatusCode::NOT_FOUND {
            return AppError::NotFound("指定されたトラックが見つかりません".to_string());
        }
    }
    tracing::warn!(error = ?e, room_id, "キュー追加に失敗");
    AppError::SpotifyApi(e)
}

/// ルーム作成リクエストのバリデーション
fn validate_create_room_request(request: &CreateRoomRequest) -> Result<(), AppError> {
    if request.room_name.trim().is_empty() {
        return Err(AppError::Validation("ルーム名は必須です".to_string()));
    }
    if let Some(code) = &request.room_code
        && code.trim().is_empty()
    {
        return Err(AppError::Validation(
            "入室コードを設定する場合は空にできません".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_room_name_required() {
        let request = CreateRoomRequest {
            room_name: "  ".to_string(),
            room_code: None,
        };
        assert!(validate_create_room_request(&request).is_err());
    }

    #[test]
    fn test_validate_empty_room_code_rejected() {
        let request = CreateRoomRequest {
            room_name: "Friday Party".to_string(),
            room_code: Some("".to_string()),
        };
        assert!(validate_create_room_request(&request).is_err());
    }

    #[test]
    fn test_validate_valid_request() {
        let request = CreateRoomRequest {
            room_name: "Friday Party".to_string(),
            room_code: Some("aux123".to_string()),
        };
        assert!(validate_create_room_request(&request).is_ok());
    }

    #[test]
    fn test_enqueue_error_mapping() {
        let forbidden = SpotifyApiError::Status {
            status: StatusCode::FORBIDDEN,
            body: String::new(),
        };
        assert!(matches!(
            map_enqueue_error(forbidden, 1),
            AppError::Forbidden(_)
        ));

        let not_found = SpotifyApiError::Status {
            status: StatusCode::NOT_FOUND,
            body: String::new(),
        };
        assert!(matches!(
            map_enqueue_error(not_found, 1),
            AppError::NotFound(_)
        ));

        let server_error = SpotifyApiError::Status {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: String::new(),
        };
        assert!(matches!(
            map_enqueue_error(server_error, 1),
            AppError::SpotifyApi(_)
        ));
    }
}
