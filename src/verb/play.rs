use std::path::Path;

use crate::error::VerbError;
use crate::types::commands::PlayCommand;
use crate::types::events::names;
use crate::types::{Command, Event};

pub(super) const TERMINAL_EVENTS: &[&str] = &[names::PLAYBACK_FINISHED, names::PLAYBACK_FAILED];

pub(super) fn command(args: &PlayCommand) -> Command {
    Command::Play(args.clone())
}

pub(super) fn outcome(event: Event) -> Result<Event, VerbError> {
    super::settle("play", names::PLAYBACK_FINISHED, event)
}

/// Media URI for a local sound file. The media server appends the extension
/// itself, so it is stripped here.
pub fn media_uri(path: &Path) -> String {
    format!("sound:{}", path.with_extension("").display())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_uri_strips_extension() {
        let uri = media_uri(Path::new("/var/cache/tts/940c2687367636c07be34668c6d8299f.wav"));
        assert_eq!(uri, "sound:/var/cache/tts/940c2687367636c07be34668c6d8299f");
    }
}
