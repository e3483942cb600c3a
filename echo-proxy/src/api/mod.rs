//! HTTP API handlers for echo-proxy

pub mod health;
pub mod identify;
pub mod playlist;
pub mod root;
pub mod token;

pub use health::health_routes;
pub use identify::identify_routes;
pub use playlist::playlist_routes;
pub use root::root_routes;
pub use token::token_routes;
