pub mod room;
pub mod spotify_token;
pub mod user;

pub use room::RoomRepository;
pub use spotify_token::SpotifyTokenRepository;
pub use user::UserRepository;
