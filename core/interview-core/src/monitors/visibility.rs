//! Tab switch detection. Every transition to hidden counts; there is no debounce.

use chrono::{DateTime, Utc};

use super::{Detector, DetectorKind, DetectorSignal, EventTopic, PageEvent, PageState};
use crate::violations::ViolationKind;

#[derive(Debug, Default)]
pub struct VisibilityDetector;

impl VisibilityDetector {
    pub fn new() -> Self {
        Self
    }
}

impl Detector for VisibilityDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::TabVisibility
    }

    fn topics(&self) -> &'static [EventTopic] {
        &[EventTopic::VisibilityChange]
    }

    fn on_event(
        &mut self,
        event: &PageEvent,
        _page: &PageState,
        _now: DateTime<Utc>,
    ) -> Vec<DetectorSignal> {
        match event {
            PageEvent::VisibilityChange { hidden: true } => {
                vec![DetectorSignal::Violation(ViolationKind::TabSwitch)]
            }
            _ => Vec::new(),
        }
    }
}
