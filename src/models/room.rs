use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;

/// リスニングルーム
///
/// オーナーごとにアクティブなルームは最大1つ。
/// 新しいルームを作成すると旧ルームは非アクティブ化される。
#[derive(Debug, FromRow, Serialize)]
pub struct Room {
    pub room_id: i64,
    pub owner_id: i64,
    pub active: bool,
    /// 入室コード（設定されている場合は join 時に一致が必要）
    #[serde(skip)]
    pub room_code: Option<String>,
    pub room_name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// 参加ルーム一覧用のサマリ（room_code は含めない）
#[derive(Debug, FromRow, Serialize)]
pub struct RoomSummary {
    pub room_id: i64,
    pub owner_id: i64,
    pub room_name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}
