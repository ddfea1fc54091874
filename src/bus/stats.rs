#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BusStats {
    published: u64,
    delivered: u64,
    dropped: u64,
    listener_panics: u64,
    unparseable: u64,
}

impl BusStats {
    pub(crate) fn record_publish(&mut self, delivered: u64, panics: u64) {
        self.published += 1;
        self.delivered += delivered;
        self.listener_panics += panics;
        if delivered == 0 && panics == 0 {
            self.dropped += 1;
        }
    }

    pub(crate) fn record_unparseable(&mut self) {
        self.unparseable += 1;
    }

    pub fn published(&self) -> u64 {
        self.published
    }

    /// Listener invocations that returned normally.
    pub fn delivered(&self) -> u64 {
        self.delivered
    }

    /// Events published with no listener registered for their leg and type.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn listener_panics(&self) -> u64 {
        self.listener_panics
    }

    pub fn unparseable(&self) -> u64 {
        self.unparseable
    }
}
