pub mod health;
pub mod login;
pub mod register;
pub mod rooms;
pub mod spotify;
pub mod user;

pub use health::health_check;
pub use login::login;
pub use register::register;
pub use rooms::{
    create_room, enqueue_track, get_joined_rooms, get_owned_room, join_room, leave_room,
};
pub use spotify::{spotify_auth, spotify_callback};
pub use user::me;
