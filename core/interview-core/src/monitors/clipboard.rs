//! Copy and paste detection. Each action is its own violation.

use chrono::{DateTime, Utc};

use super::{Detector, DetectorKind, DetectorSignal, EventTopic, PageEvent, PageState};
use crate::violations::ViolationKind;

#[derive(Debug, Default)]
pub struct ClipboardDetector;

impl ClipboardDetector {
    pub fn new() -> Self {
        Self
    }
}

impl Detector for ClipboardDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::Clipboard
    }

    fn topics(&self) -> &'static [EventTopic] {
        &[EventTopic::Copy, EventTopic::Paste]
    }

    fn on_event(
        &mut self,
        event: &PageEvent,
        _page: &PageState,
        _now: DateTime<Utc>,
    ) -> Vec<DetectorSignal> {
        match event {
            PageEvent::Copy => vec![DetectorSignal::Violation(ViolationKind::ClipboardCopy)],
            PageEvent::Paste => vec![DetectorSignal::Violation(ViolationKind::ClipboardPaste)],
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copy_and_paste_are_distinct() {
        let mut detector = ClipboardDetector::new();
        let page = PageState::default();
        assert_eq!(
            detector.on_event(&PageEvent::Copy, &page, Utc::now()),
            vec![DetectorSignal::Violation(ViolationKind::ClipboardCopy)]
        );
        assert_eq!(
            detector.on_event(&PageEvent::Paste, &page, Utc::now()),
            vec![DetectorSignal::Violation(ViolationKind::ClipboardPaste)]
        );
    }
}
