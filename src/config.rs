/// Engine-level constants
pub const ENGINE_NAME: &str = "medrisk";
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
