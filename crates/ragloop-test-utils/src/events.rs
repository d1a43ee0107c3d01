use parking_lot::Mutex;
use ragloop_protocol::{EventMsg, EventPayload, EventSink, QueryStage};

/// Event sink keeping every emitted event in memory.
#[derive(Debug, Default)]
pub struct RecordingEventSink {
    events: Mutex<Vec<EventMsg>>,
}

impl RecordingEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<EventMsg> {
        self.events.lock().clone()
    }

    pub fn payloads(&self) -> Vec<EventPayload> {
        self.events
            .lock()
            .iter()
            .map(|event| event.payload.clone())
            .collect()
    }

    /// Target stage of every `StageChanged` event, in order.
    pub fn stages(&self) -> Vec<QueryStage> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event.payload {
                EventPayload::StageChanged { to, .. } => Some(to),
                _ => None,
            })
            .collect()
    }
}

impl EventSink for RecordingEventSink {
    fn emit(&self, event: EventMsg) {
        self.events.lock().push(event);
    }
}
