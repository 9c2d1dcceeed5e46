//! Multi-monitor heuristics.
//!
//! Two checks, in order:
//!
//! 1. Available screen width more than `width_ratio` × the window's inner
//!    width suggests the desktop spans a second monitor.
//! 2. Otherwise, when the outer window and the screen disagree on size and
//!    the area difference exceeds `area_ratio` of the screen area, the
//!    configuration is flagged as suspicious.
//!
//! Both are noisy: browser zoom and DPI scaling change the reported sizes.
//! They are kept as-is rather than tightened.
//!
//! Runs once on start, on every resize, and on `Tick` events at most once
//! per poll interval.

use chrono::{DateTime, Duration, Utc};

use super::{
    Detector, DetectorKind, DetectorSignal, EventTopic, PageEvent, PageState, WindowGeometry,
};
use crate::config::ProctoringConfig;
use crate::violations::ViolationKind;

#[derive(Debug)]
pub struct ScreenDetector {
    width_ratio: f64,
    area_ratio: f64,
    poll_interval: Duration,
    last_poll: Option<DateTime<Utc>>,
}

impl ScreenDetector {
    pub fn new(width_ratio: f64, area_ratio: f64, poll_interval: Duration) -> Self {
        Self {
            width_ratio,
            area_ratio,
            poll_interval,
            last_poll: None,
        }
    }

    pub fn from_config(config: &ProctoringConfig) -> Self {
        let poll_secs = i64::try_from(config.screen_poll_secs).unwrap_or(i64::MAX);
        Self::new(
            config.multi_monitor_width_ratio,
            config.screen_area_ratio,
            Duration::seconds(poll_secs),
        )
    }

    pub fn assess(&self, geometry: &WindowGeometry) -> Option<ViolationKind> {
        if !geometry.is_known() {
            return None;
        }

        if f64::from(geometry.avail_width) > f64::from(geometry.inner_width) * self.width_ratio {
            return Some(ViolationKind::MultiMonitor);
        }

        if geometry.screen_width != geometry.outer_width
            || geometry.screen_height != geometry.outer_height
        {
            let screen_area = f64::from(geometry.screen_width) * f64::from(geometry.screen_height);
            let outer_area = f64::from(geometry.outer_width) * f64::from(geometry.outer_height);
            if (screen_area - outer_area).abs() > screen_area * self.area_ratio {
                return Some(ViolationKind::SuspiciousScreenConfig);
            }
        }

        None
    }

    fn check(&self, page: &PageState) -> Vec<DetectorSignal> {
        self.assess(&page.geometry)
            .map(DetectorSignal::Violation)
            .into_iter()
            .collect()
    }

    fn poll_due(&self, now: DateTime<Utc>) -> bool {
        match self.last_poll {
            Some(last) => now.signed_duration_since(last) >= self.poll_interval,
            None => true,
        }
    }
}

impl Detector for ScreenDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::MultiMonitor
    }

    fn topics(&self) -> &'static [EventTopic] {
        &[EventTopic::Resize, EventTopic::Tick]
    }

    fn on_start(&mut self, page: &PageState, now: DateTime<Utc>) -> Vec<DetectorSignal> {
        self.last_poll = Some(now);
        self.check(page)
    }

    fn on_event(
        &mut self,
        event: &PageEvent,
        page: &PageState,
        now: DateTime<Utc>,
    ) -> Vec<DetectorSignal> {
        match event {
            PageEvent::Resize { .. } => self.check(page),
            PageEvent::Tick if self.poll_due(now) => {
                self.last_poll = Some(now);
                self.check(page)
            }
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> ScreenDetector {
        ScreenDetector::from_config(&ProctoringConfig::default())
    }

    fn page(geometry: WindowGeometry) -> PageState {
        PageState {
            fullscreen: false,
            hidden: false,
            geometry,
        }
    }

    #[test]
    fn test_wide_desktop_is_multi_monitor() {
        let geometry = WindowGeometry {
            avail_width: 3840,
            ..WindowGeometry::maximized(1920, 1080)
        };
        assert_eq!(
            detector().assess(&geometry),
            Some(ViolationKind::MultiMonitor)
        );
    }

    #[test]
    fn test_small_window_is_suspicious() {
        let geometry = WindowGeometry {
            inner_width: 1280,
            outer_width: 1280,
            outer_height: 700,
            inner_height: 650,
            ..WindowGeometry::maximized(1920, 1080)
        };
        // 1920*1080 - 1280*700 = 1_177_600 > 414_720
        assert_eq!(
            detector().assess(&geometry),
            Some(ViolationKind::SuspiciousScreenConfig)
        );
    }

    #[test]
    fn test_slightly_smaller_window_is_fine() {
        let geometry = WindowGeometry {
            outer_height: 1040,
            inner_height: 980,
            ..WindowGeometry::maximized(1920, 1080)
        };
        assert_eq!(detector().assess(&geometry), None);
    }

    #[test]
    fn test_maximized_single_screen_is_fine() {
        let geometry = WindowGeometry::maximized(2560, 1440);
        assert_eq!(detector().assess(&geometry), None);
    }

    #[test]
    fn test_tick_polls_once_per_interval() {
        let mut detector = detector();
        let geometry = WindowGeometry {
            avail_width: 3840,
            ..WindowGeometry::maximized(1920, 1080)
        };
        let page = page(geometry);
        let start = Utc::now();

        assert_eq!(detector.on_start(&page, start).len(), 1);

        let early = detector.on_event(&PageEvent::Tick, &page, start + Duration::seconds(5));
        assert!(early.is_empty());
        let due = detector.on_event(&PageEvent::Tick, &page, start + Duration::seconds(10));
        assert_eq!(due.len(), 1);
        let again = detector.on_event(&PageEvent::Tick, &page, start + Duration::seconds(15));
        assert!(again.is_empty());
    }

    #[test]
    fn test_resize_checks_regardless_of_interval() {
        let mut detector = detector();
        let geometry = WindowGeometry {
            avail_width: 3840,
            ..WindowGeometry::maximized(1920, 1080)
        };
        let page = page(geometry);
        let now = Utc::now();
        detector.on_start(&page, now);

        let signals = detector.on_event(&PageEvent::Resize { geometry }, &page, now);
        assert_eq!(
            signals,
            vec![DetectorSignal::Violation(ViolationKind::MultiMonitor)]
        );
    }
}
