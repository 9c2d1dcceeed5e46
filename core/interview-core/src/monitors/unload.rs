//! Leave-page protection. Blocks navigation but is not itself a violation.

use chrono::{DateTime, Utc};

use super::{Detector, DetectorKind, DetectorSignal, EventTopic, PageEvent, PageState};

#[derive(Debug, Default)]
pub struct UnloadDetector;

impl UnloadDetector {
    pub fn new() -> Self {
        Self
    }
}

impl Detector for UnloadDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::PageUnload
    }

    fn topics(&self) -> &'static [EventTopic] {
        &[EventTopic::BeforeUnload]
    }

    fn on_event(
        &mut self,
        event: &PageEvent,
        _page: &PageState,
        _now: DateTime<Utc>,
    ) -> Vec<DetectorSignal> {
        match event {
            PageEvent::BeforeUnload => vec![DetectorSignal::BlockUnload],
            _ => Vec::new(),
        }
    }
}
