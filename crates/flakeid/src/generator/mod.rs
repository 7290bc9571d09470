mod atomic;
mod backoff;
mod interface;
mod lock;
mod state;
mod status;

pub use atomic::*;
pub use backoff::*;
pub use interface::*;
pub use lock::*;
pub use status::*;
