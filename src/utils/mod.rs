pub mod fs;
pub mod logging;
pub mod serde_b64;
