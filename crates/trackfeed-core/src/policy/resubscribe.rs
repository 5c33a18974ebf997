/// Fires on every transition into the connected state.
///
/// The first observation counts as a transition from disconnected, so a
/// transport that is already up at startup triggers one subscription.
#[derive(Debug, Default)]
pub struct ResubscribeGate {
    connected: bool,
}

impl ResubscribeGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the latest connectivity. Returns `true` when a start request
    /// should be sent.
    pub fn observe(&mut self, connected: bool) -> bool {
        let was = std::mem::replace(&mut self.connected, connected);
        connected && !was
    }

    /// Record connectivity delivered by a change notification.
    ///
    /// The channel only notifies on a real flip but keeps the latest value,
    /// so a notification that still reads "connected" while the gate is
    /// connected means a disconnect and reconnect happened in between.
    pub fn observe_change(&mut self, connected: bool) -> bool {
        if connected && self.connected {
            self.connected = false;
        }
        self.observe(connected)
    }
}
