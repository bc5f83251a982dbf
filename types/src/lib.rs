pub mod error_code;
pub mod state;

pub use error_code::{ErrorCode, UnknownCode};
pub use state::RngState;
