/// `play` arguments
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayCommand {
    /// Media URI understood by the media server, e.g. `sound:hello-world`
    media: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    offset_ms: Option<u64>,
}

impl PlayCommand {
    pub fn new(media: &str) -> Self {
        Self {
            media: media.to_string(),
            offset_ms: None,
        }
    }

    pub fn with_offset_ms(mut self, offset_ms: u64) -> Self {
        self.offset_ms = Some(offset_ms);
        self
    }

    pub fn media(&self) -> &str {
        &self.media
    }

    pub fn offset_ms(&self) -> Option<u64> {
        self.offset_ms
    }
}

/// `gather` arguments
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatherCommand {
    /// Media played while collecting digits
    #[serde(skip_serializing_if = "Option::is_none")]
    prompt: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    max_digits: Option<u32>,

    /// Inter-digit timeout enforced by the media server
    #[serde(skip_serializing_if = "Option::is_none")]
    timeout_ms: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    finish_on_key: Option<String>,
}

impl GatherCommand {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prompt(mut self, media: &str) -> Self {
        self.prompt = Some(media.to_string());
        self
    }

    pub fn with_max_digits(mut self, max_digits: u32) -> Self {
        self.max_digits = Some(max_digits);
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    pub fn with_finish_on_key(mut self, key: &str) -> Self {
        self.finish_on_key = Some(key.to_string());
        self
    }

    pub fn prompt(&self) -> Option<&str> {
        self.prompt.as_deref()
    }

    pub fn max_digits(&self) -> Option<u32> {
        self.max_digits
    }

    pub fn timeout_ms(&self) -> Option<u64> {
        self.timeout_ms
    }

    pub fn finish_on_key(&self) -> Option<&str> {
        self.finish_on_key.as_deref()
    }
}

/// `dial` arguments
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialCommand {
    destination: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    timeout_secs: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    caller_id: Option<String>,
}

impl DialCommand {
    pub fn new(destination: &str) -> Self {
        Self {
            destination: destination.to_string(),
            timeout_secs: None,
            caller_id: None,
        }
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u32) -> Self {
        self.timeout_secs = Some(timeout_secs);
        self
    }

    pub fn with_caller_id(mut self, caller_id: &str) -> Self {
        self.caller_id = Some(caller_id.to_string());
        self
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    pub fn timeout_secs(&self) -> Option<u32> {
        self.timeout_secs
    }

    pub fn caller_id(&self) -> Option<&str> {
        self.caller_id.as_deref()
    }
}

/// `record` arguments
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordCommand {
    format: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    max_duration_secs: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    max_silence_secs: Option<u32>,

    beep: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    finish_on_key: Option<String>,
}

impl Default for RecordCommand {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordCommand {
    pub fn new() -> Self {
        Self {
            format: "wav".to_string(),
            max_duration_secs: None,
            max_silence_secs: None,
            beep: true,
            finish_on_key: None,
        }
    }

    pub fn with_format(mut self, format: &str) -> Self {
        self.format = format.to_string();
        self
    }

    pub fn with_max_duration_secs(mut self, secs: u32) -> Self {
        self.max_duration_secs = Some(secs);
        self
    }

    pub fn with_max_silence_secs(mut self, secs: u32) -> Self {
        self.max_silence_secs = Some(secs);
        self
    }

    pub fn with_beep(mut self, beep: bool) -> Self {
        self.beep = beep;
        self
    }

    pub fn with_finish_on_key(mut self, key: &str) -> Self {
        self.finish_on_key = Some(key.to_string());
        self
    }

    pub fn format(&self) -> &str {
        &self.format
    }

    pub fn max_duration_secs(&self) -> Option<u32> {
        self.max_duration_secs
    }

    pub fn max_silence_secs(&self) -> Option<u32> {
        self.max_silence_secs
    }

    pub fn beep(&self) -> bool {
        self.beep
    }

    pub fn finish_on_key(&self) -> Option<&str> {
        self.finish_on_key.as_deref()
    }
}
