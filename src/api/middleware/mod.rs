pub mod auth;
pub mod timing;

pub use auth::AdminAuth;
pub use timing::TimingMiddleware;
