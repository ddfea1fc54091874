#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct Stats {
    commands_sent: u64,
    frames_received: u64,
    unparseable_frames: u64,
}

impl Stats {
    pub(crate) fn record_command(&mut self) {
        self.commands_sent += 1;
    }

    pub(crate) fn record_frame(&mut self) {
        self.frames_received += 1;
    }

    pub(crate) fn record_unparseable(&mut self) {
        self.unparseable_frames += 1;
    }

    pub fn commands_sent(&self) -> u64 {
        self.commands_sent
    }

    pub fn frames_received(&self) -> u64 {
        self.frames_received
    }

    pub fn unparseable_frames(&self) -> u64 {
        self.unparseable_frames
    }
}
