#[cfg(feature = "context")]
pub mod context;
#[cfg(feature = "http")]
pub mod http;
#[cfg(feature = "prelude")]
pub mod prelude;
#[cfg(feature = "ratelimiter")]
pub mod ratelimiter;
#[cfg(feature = "signal")]
pub mod signal;
