pub mod auth;
pub mod jwt;
pub mod spotify;
pub mod token;

pub use auth::AuthService;
pub use jwt::{Audience, JwtService};
pub use spotify::SpotifyClient;
pub use token::TokenResolver;
