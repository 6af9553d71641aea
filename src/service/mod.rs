//! HTTP handlers and the downstream client they use.

pub mod backend;
pub mod greeting;
pub mod work;

pub use backend::BackendClient;
pub use greeting::greeting;
pub use work::{work, WorkState};
