pub mod room;
pub mod spotify_token;
pub mod user;

pub use room::{Room, RoomSummary};
pub use spotify_token::{SpotifyToken, SpotifyTokenUpsert};
pub use user::User;
