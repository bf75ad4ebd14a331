use axum::{Json, extract::State};
use serde::Serialize;

use crate::state::AppState;

/// ヘルスチェックレスポンス
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    /// データベース接続の状態（"ok" / "unavailable"）
    pub database: &'static str,
}

/// ヘルスチェックハンドラー
///
/// GET /api/health
///
/// データベース接続を含むサービスの稼働状況を返す。
/// 接続プールが応答しない場合も 200 で degraded を返し、
/// 死活判定はモニタリング側に委ねる。
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let database_ok = sqlx::query("SELECT 1").execute(&state.db_pool).await.is_ok();

    if !database_ok {
        tracing::warn!("ヘルスチェック: データベース接続に失敗");
    }

    Json(health_response(database_ok))
}

/// データベースの状態からレスポンスを組み立てる
fn health_response(database_ok: bool) -> HealthResponse {
    HealthResponse {
        status: if database_ok { "ok" } else { "degraded" },
        service: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        database: if database_ok { "ok" } else { "unavailable" },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_response_when_database_ok() {
        let response = health_response(true);
        assert_eq!(response.status, "ok");
        assert_eq!(response.database, "ok");
        assert_eq!(response.service, "auxify");
        assert_eq!(response.version, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_health_response_when_database_unavailable() {
        let response = health_response(false);
        assert_eq!(response.status, "degraded");
        assert_eq!(response.database, "unavailable");
    }
}
