pub mod audio;
pub mod tts;

pub use audio::transcode;
pub use tts::{compute_filename, options_to_query_string};
