//! Minimized or shrunken window detection.

use chrono::{DateTime, Utc};

use super::{
    Detector, DetectorKind, DetectorSignal, EventTopic, PageEvent, PageState, WindowGeometry,
};
use crate::violations::ViolationKind;

#[derive(Debug)]
pub struct ResizeDetector {
    height_ratio: f64,
}

impl ResizeDetector {
    pub fn new(height_ratio: f64) -> Self {
        Self { height_ratio }
    }

    /// True when the window's outer height is below `height_ratio` of the screen.
    pub fn is_shrunken(&self, geometry: &WindowGeometry) -> bool {
        if !geometry.is_known() {
            return false;
        }
        let min_height = f64::from(geometry.screen_height) * self.height_ratio;
        f64::from(geometry.outer_height) < min_height
    }
}

impl Detector for ResizeDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::WindowResize
    }

    fn topics(&self) -> &'static [EventTopic] {
        &[EventTopic::Resize]
    }

    fn on_event(
        &mut self,
        event: &PageEvent,
        page: &PageState,
        _now: DateTime<Utc>,
    ) -> Vec<DetectorSignal> {
        match event {
            PageEvent::Resize { .. } if !page.fullscreen && self.is_shrunken(&page.geometry) => {
                vec![DetectorSignal::Violation(ViolationKind::WindowResize)]
            }
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_with_outer_height(outer_height: u32, fullscreen: bool) -> (PageEvent, PageState) {
        let geometry = WindowGeometry {
            outer_height,
            ..WindowGeometry::maximized(1920, 1000)
        };
        (
            PageEvent::Resize { geometry },
            PageState {
                fullscreen,
                hidden: false,
                geometry,
            },
        )
    }

    #[test]
    fn test_below_ninety_percent_counts() {
        let mut detector = ResizeDetector::new(0.9);
        let (event, page) = page_with_outer_height(899, false);
        assert_eq!(
            detector.on_event(&event, &page, Utc::now()),
            vec![DetectorSignal::Violation(ViolationKind::WindowResize)]
        );
    }

    #[test]
    fn test_at_ninety_percent_is_allowed() {
        let mut detector = ResizeDetector::new(0.9);
        let (event, page) = page_with_outer_height(900, false);
        assert!(detector.on_event(&event, &page, Utc::now()).is_empty());
    }

    #[test]
    fn test_fullscreen_suppresses_check() {
        let mut detector = ResizeDetector::new(0.9);
        let (event, page) = page_with_outer_height(100, true);
        assert!(detector.on_event(&event, &page, Utc::now()).is_empty());
    }

    #[test]
    fn test_unknown_geometry_is_ignored() {
        let detector = ResizeDetector::new(0.9);
        assert!(!detector.is_shrunken(&WindowGeometry::default()));
    }
}
