use sqlx::PgPool;

use crate::models::{Room, RoomSummary};

#[derive(Clone)]
pub struct RoomRepository {
    pool: PgPool,
}

impl RoomRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 新しいルームを作成
    ///
    /// オーナーの既存ルームを同一トランザクション内で非アクティブ化してから
    /// 挿入する（アクティブなルームはオーナーごとに最大1つ）。
    pub async fn create_room(
        &self,
        owner_id: i64,
        room_code: Option<&str>,
        room_name: &str,
    ) -> Result<Room, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            UPDATE rooms
            SET active = FALSE
            WHERE owner_id = $1
            "#,
        )
        .bind(owner_id)
        .execute(&mut *tx)
        .await?;

        let room = sqlx::query_as::<_, Room>(
            r#"
            INSERT INTO rooms (owner_id, active, room_code, room_name)
            VALUES ($1, TRUE, $2, $3)
            RETURNING room_id, owner_id, active, room_code, room_name, created_at
            "#,
        )
        .bind(owner_id)
        .bind(room_code)
        .bind(room_name)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(room)
    }

    /// ルームIDでルームを検索
    pub async fn find_by_id(&self, room_id: i64) -> Result<Option<Room>, sqlx::Error> {
        sqlx::query_as::<_, Room>(
            r#"
            SELECT room_id, owner_id, active, room_code, room_name, created_at
            FROM rooms
            WHERE room_id = $1
            "#,
        )
        .bind(room_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// オーナーのアクティブなルームを検索
    pub async fn find_active_by_owner(&self, owner_id: i64) -> Result<Option<Room>, sqlx::Error> {
        sqlx::query_as::<_, Room>(
            r#"
            SELECT room_id, owner_id, active, room_code, room_name, created_at
            FROM rooms
            WHERE owner_id = $1
              AND active = TRUE
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// ユーザーが参加（またはオーナー）しているアクティブなルーム一覧を取得
    pub async fn find_joined_by_user(&self, user_id: i64) -> Result<Vec<RoomSummary>, sqlx::Error> {
        sqlx::query_as::<_, RoomSummary>(
            r#"
            SELECT DISTINCT rooms.room_id, rooms.owner_id, rooms.room_name, rooms.created_at
            FROM rooms
            LEFT JOIN room_members ON room_members.room_id = rooms.room_id
            WHERE (room_members.user_id = $1 OR rooms.owner_id = $1)
              AND rooms.active = TRUE
            ORDER BY rooms.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    /// ユーザーをルームに追加（既に参加済みなら何もしない）
    pub async fn add_member(&self, room_id: i64, user_id: i64) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO room_members (room_id, user_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(room_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// ユーザーをルームから削除
    pub async fn remove_member(&self, room_id: i64, user_id: i64) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            DELETE FROM room_members
            WHERE room_id = $1
              AND user_id = $2
            "#,
        )
        .bind(room_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// ユーザーがルームのメンバーかどうかを確認（オーナーは含まない）
    pub async fn is_member(&self, room_id: i64, user_id: i64) -> Result<bool, sqlx::Error> {
        let row: Option<(i64,)> = sqlx::query_as(
            r#"
            SELECT user_id
            FROM room_members
            WHERE room_id = $1
              AND user_id = $2
            LIMIT 1
            "#,
        )
        .bind(room_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.is_some())
    }
}
