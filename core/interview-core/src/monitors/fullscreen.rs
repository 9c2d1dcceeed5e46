//! Fullscreen exit detection.
//!
//! Leaving fullscreen counts as a violation and asks the candidate to go
//! back. Re-entry is never forced: the browser only grants fullscreen from a
//! user gesture, so the host shows a consent prompt instead.

use chrono::{DateTime, Utc};

use super::{Detector, DetectorKind, DetectorSignal, EventTopic, PageEvent, PageState};
use crate::violations::ViolationKind;

#[derive(Debug, Default)]
pub struct FullscreenDetector;

impl FullscreenDetector {
    pub fn new() -> Self {
        Self
    }
}

impl Detector for FullscreenDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::Fullscreen
    }

    fn topics(&self) -> &'static [EventTopic] {
        &[EventTopic::FullscreenChange]
    }

    fn on_start(&mut self, page: &PageState, _now: DateTime<Utc>) -> Vec<DetectorSignal> {
        if page.fullscreen {
            Vec::new()
        } else {
            vec![DetectorSignal::PromptFullscreen]
        }
    }

    fn on_event(
        &mut self,
        event: &PageEvent,
        _page: &PageState,
        _now: DateTime<Utc>,
    ) -> Vec<DetectorSignal> {
        match event {
            PageEvent::FullscreenChange { fullscreen: false } => vec![
                DetectorSignal::Violation(ViolationKind::FullscreenExit),
                DetectorSignal::PromptFullscreen,
            ],
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_outside_fullscreen_prompts() {
        let mut detector = FullscreenDetector::new();
        let signals = detector.on_start(&PageState::default(), Utc::now());
        assert_eq!(signals, vec![DetectorSignal::PromptFullscreen]);
    }

    #[test]
    fn test_start_in_fullscreen_is_silent() {
        let mut detector = FullscreenDetector::new();
        let page = PageState {
            fullscreen: true,
            ..PageState::default()
        };
        assert!(detector.on_start(&page, Utc::now()).is_empty());
    }

    #[test]
    fn test_exit_reports_violation_then_prompt() {
        let mut detector = FullscreenDetector::new();
        let signals = detector.on_event(
            &PageEvent::FullscreenChange { fullscreen: false },
            &PageState::default(),
            Utc::now(),
        );
        assert_eq!(
            signals,
            vec![
                DetectorSignal::Violation(ViolationKind::FullscreenExit),
                DetectorSignal::PromptFullscreen
            ]
        );
    }

    #[test]
    fn test_entering_fullscreen_is_ignored() {
        let mut detector = FullscreenDetector::new();
        let signals = detector.on_event(
            &PageEvent::FullscreenChange { fullscreen: true },
            &PageState::default(),
            Utc::now(),
        );
        assert!(signals.is_empty());
    }
}
