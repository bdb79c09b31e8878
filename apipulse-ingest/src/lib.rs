pub mod geoip;
pub mod handler;
pub mod privacy;
pub mod ratelimit;
pub mod server;

pub use geoip::{CountryResolver, GeoIpResolver};
pub use handler::AppState;
pub use ratelimit::RateLimiter;
