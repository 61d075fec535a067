mod http_error;
mod normalized;
mod raw_error;

pub use http_error::*;
pub use normalized::*;
pub use raw_error::*;
