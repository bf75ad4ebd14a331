use std::sync::Arc;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use time::Duration;

use crate::config::Config;
use crate::repositories::{RoomRepository, SpotifyTokenRepository, UserRepository};
use crate::services::{JwtService, SpotifyClient, TokenResolver};

/// アプリケーション共有状態
///
/// axum の State として全ハンドラーで共有される。
/// Clone は必須（axum が内部で clone するため）。
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL コネクションプール
    pub db_pool: PgPool,
    /// アプリケーション設定（Arc で共有）
    pub config: Arc<Config>,
    /// ユーザーリポジトリ
    pub user_repo: UserRepository,
    /// ルームリポジトリ
    pub room_repo: RoomRepository,
    /// Spotify API クライアント
    pub spotify_client: SpotifyClient,
    /// Spotify トークンリポジトリ（コールバックでの upsert 用）
    pub token_repo: SpotifyTokenRepository,
    /// トークンレゾルバ（ストアとクライアントを束ねる）
    pub token_resolver: TokenResolver<SpotifyTokenRepository, SpotifyClient>,
    /// セッション JWT サービス
    pub jwt: JwtService,
}

impl AppState {
    /// 新しい AppState を作成
    pub fn new(db_pool: PgPool, config: Config) -> Self {
        let config = Arc::new(config);
        let user_repo = UserRepository::new(db_pool.clone());
        let room_repo = RoomRepository::new(db_pool.clone());

        let spotify_client = SpotifyClient::new(
            config.spotify_client_id.clone(),
            config.spotify_client_secret.expose_secret().clone(),
            config.spotify_redirect_uri.clone(),
        );

        let token_repo = SpotifyTokenRepository::new(db_pool.clone());
        let token_resolver = TokenResolver::new(
            token_repo.clone(),
            spotify_client.clone(),
            Duration::seconds(config.token_refresh_margin_secs),
        );

        let jwt = JwtService::new(config.jwt_secret.expose_secret().as_bytes());

        Self {
            db_pool,
            config,
            user_repo,
            room_repo,
            spotify_client,
            token_repo,
            token_resolver,
            jwt,
        }
    }
}
