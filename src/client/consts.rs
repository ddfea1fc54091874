pub const MEDIA_SERVER_URL: &str = "MEDIA_SERVER_URL";
pub const MEDIA_SERVER_TOKEN: &str = "MEDIA_SERVER_TOKEN";
pub const VERB_TIMEOUT_MS: &str = "VERB_TIMEOUT_MS";

pub const DEFAULT_URL: &str = "ws://127.0.0.1:8088/voice";
pub const DEFAULT_CAPACITY: usize = 1024;

pub const AUTHORIZATION_HEADER: &str = "Authorization";
