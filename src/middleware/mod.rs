pub mod gate;
pub mod response;

pub use gate::{with_auth, AuthUser, Credentials, Gate};
pub use response::{ApiResponse, ApiResult};
