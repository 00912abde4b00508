pub mod api_response;
pub mod error;
pub mod json_path;
pub mod result;

pub use api_response::{ApiError, ApiResponse, ErrorResponse};
pub use error::{AppError, ErrorKind};
pub use result::AppResult;
