pub mod bucket;
pub mod config;
pub mod config_validator;
pub mod error;
pub mod handlers;
pub mod health;
pub mod key_generator;
pub mod metrics;
pub mod middleware;
pub mod response;
pub mod server;
pub mod store;
pub mod throttler;
pub mod validation;

pub use bucket::Bucket;
pub use config::Settings;
pub use error::{ThrottlerError, ThrottlerResult};
pub use server::create_app;
pub use store::{BucketStore, MemoryStore, RedisStore};
pub use throttler::{ThrottleOptions, Throttler, ThrottlerBuilder};
