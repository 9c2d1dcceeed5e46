//! Proctoring detectors.
//!
//! # Architecture
//!
//! The host forwards browser events as [`PageEvent`]s. Each detector declares
//! the event topics it listens to; starting a [`Monitor`] registers those
//! topics on the shared [`EventHub`] and keeps the resulting [`StopHandle`].
//! Dispatch only reaches detectors with live registrations, so once a
//! monitor is stopped no event can produce a signal from it.
//!
//! ```text
//! host event → PageState::apply → EventHub (topic → owners) → Detector → DetectorSignal
//! ```
//!
//! Detectors never call platform APIs. They return signals, and the
//! proctoring session turns those into violations and host effects.
//!
//! # Module Structure
//!
//! - [`fullscreen`]: fullscreen exit + consent prompt
//! - [`visibility`]: tab switches
//! - [`resize`]: minimized or shrunken windows
//! - [`clipboard`]: copy and paste
//! - [`screens`]: multi-monitor heuristics (polled)
//! - [`unload`]: navigation blocking

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::ProctoringConfig;
use crate::violations::ViolationKind;

pub mod clipboard;
pub mod fullscreen;
pub mod resize;
pub mod screens;
pub mod unload;
pub mod visibility;

pub use clipboard::ClipboardDetector;
pub use fullscreen::FullscreenDetector;
pub use resize::ResizeDetector;
pub use screens::ScreenDetector;
pub use unload::UnloadDetector;
pub use visibility::VisibilityDetector;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventTopic {
    FullscreenChange,
    VisibilityChange,
    Resize,
    Copy,
    Paste,
    Tick,
    BeforeUnload,
}

/// Screen and window dimensions in CSS pixels, as reported by the host.
///
/// All zeros means the host has not reported geometry yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WindowGeometry {
    pub screen_width: u32,
    pub screen_height: u32,
    pub avail_width: u32,
    pub inner_width: u32,
    pub inner_height: u32,
    pub outer_width: u32,
    pub outer_height: u32,
}

impl WindowGeometry {
    pub fn is_known(&self) -> bool {
        self.screen_width > 0 && self.screen_height > 0
    }

    /// A maximized window on a single screen.
    pub fn maximized(width: u32, height: u32) -> Self {
        Self {
            screen_width: width,
            screen_height: height,
            avail_width: width,
            inner_width: width,
            inner_height: height,
            outer_width: width,
            outer_height: height,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PageEvent {
    FullscreenChange { fullscreen: bool },
    VisibilityChange { hidden: bool },
    Resize { geometry: WindowGeometry },
    Copy,
    Paste,
    /// Timer heartbeat; polled detectors compare the event time to their interval.
    Tick,
    BeforeUnload,
}

impl PageEvent {
    pub fn topic(&self) -> EventTopic {
        match self {
            PageEvent::FullscreenChange { .. } => EventTopic::FullscreenChange,
            PageEvent::VisibilityChange { .. } => EventTopic::VisibilityChange,
            PageEvent::Resize { .. } => EventTopic::Resize,
            PageEvent::Copy => EventTopic::Copy,
            PageEvent::Paste => EventTopic::Paste,
            PageEvent::Tick => EventTopic::Tick,
            PageEvent::BeforeUnload => EventTopic::BeforeUnload,
        }
    }
}

/// Last known page state, updated before every dispatch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageState {
    pub fullscreen: bool,
    pub hidden: bool,
    pub geometry: WindowGeometry,
}

impl PageState {
    pub fn apply(&mut self, event: &PageEvent) {
        match event {
            PageEvent::FullscreenChange { fullscreen } => self.fullscreen = *fullscreen,
            PageEvent::VisibilityChange { hidden } => self.hidden = *hidden,
            PageEvent::Resize { geometry } => self.geometry = *geometry,
            PageEvent::Copy | PageEvent::Paste | PageEvent::Tick | PageEvent::BeforeUnload => {}
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorSignal {
    Violation(ViolationKind),
    /// Ask the candidate to re-enter fullscreen.
    PromptFullscreen,
    /// Ask the browser to show its leave-page confirmation.
    BlockUnload,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectorKind {
    Fullscreen,
    TabVisibility,
    WindowResize,
    Clipboard,
    MultiMonitor,
    PageUnload,
}

pub trait Detector {
    fn kind(&self) -> DetectorKind;

    fn topics(&self) -> &'static [EventTopic];

    /// Signals raised when the detector is attached, before any event arrives.
    fn on_start(&mut self, _page: &PageState, _now: DateTime<Utc>) -> Vec<DetectorSignal> {
        Vec::new()
    }

    fn on_event(
        &mut self,
        event: &PageEvent,
        page: &PageState,
        now: DateTime<Utc>,
    ) -> Vec<DetectorSignal>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// Listener registry
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

#[derive(Debug, Clone, Copy)]
struct Listener {
    topic: EventTopic,
    owner: DetectorKind,
}

/// Topic → owner registrations. Ids are issued in increasing order, so
/// iteration follows registration order.
#[derive(Debug, Default)]
pub struct EventHub {
    next_id: u64,
    listeners: BTreeMap<ListenerId, Listener>,
}

impl EventHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_listener(&mut self, topic: EventTopic, owner: DetectorKind) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.insert(id, Listener { topic, owner });
        id
    }

    /// Returns false when the id was already removed.
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(&id).is_some()
    }

    pub fn owners_for(&self, topic: EventTopic) -> Vec<DetectorKind> {
        let mut owners: Vec<DetectorKind> = Vec::new();
        for listener in self.listeners.values() {
            if listener.topic == topic && !owners.contains(&listener.owner) {
                owners.push(listener.owner);
            }
        }
        owners
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn listeners_owned_by(&self, owner: DetectorKind) -> usize {
        self.listeners
            .values()
            .filter(|listener| listener.owner == owner)
            .count()
    }
}

/// The registrations made by one `Monitor::start`. Consumed by `stop`.
#[derive(Debug)]
#[must_use = "dropping a StopHandle leaks its listener registrations"]
pub struct StopHandle {
    listeners: Vec<ListenerId>,
}

impl StopHandle {
    pub fn stop(self, hub: &mut EventHub) {
        for id in self.listeners {
            hub.remove_listener(id);
        }
    }
}

/// A detector plus its registration state.
pub struct Monitor {
    detector: Box<dyn Detector>,
    handle: Option<StopHandle>,
}

impl Monitor {
    pub fn new(detector: Box<dyn Detector>) -> Self {
        Self {
            detector,
            handle: None,
        }
    }

    pub fn kind(&self) -> DetectorKind {
        self.detector.kind()
    }

    pub fn is_active(&self) -> bool {
        self.handle.is_some()
    }

    /// Registers the detector's topics. A second call while started is a no-op.
    pub fn start(
        &mut self,
        hub: &mut EventHub,
        page: &PageState,
        now: DateTime<Utc>,
    ) -> Vec<DetectorSignal> {
        if self.handle.is_some() {
            return Vec::new();
        }

        let owner = self.detector.kind();
        let listeners = self
            .detector
            .topics()
            .iter()
            .map(|topic| hub.add_listener(*topic, owner))
            .collect();
        self.handle = Some(StopHandle { listeners });

        self.detector.on_start(page, now)
    }

    pub fn stop(&mut self, hub: &mut EventHub) {
        if let Some(handle) = self.handle.take() {
            handle.stop(hub);
        }
    }
}

/// Every detector used during a proctored session, sharing one hub.
pub struct MonitorSet {
    hub: EventHub,
    monitors: Vec<Monitor>,
}

impl MonitorSet {
    pub fn new(detectors: Vec<Box<dyn Detector>>) -> Self {
        Self {
            hub: EventHub::new(),
            monitors: detectors.into_iter().map(Monitor::new).collect(),
        }
    }

    /// The six standard detectors, tuned by `config`.
    pub fn standard(config: &ProctoringConfig) -> Self {
        Self::new(vec![
            Box::new(FullscreenDetector::new()),
            Box::new(VisibilityDetector::new()),
            Box::new(ResizeDetector::new(config.resize_height_ratio)),
            Box::new(ClipboardDetector::new()),
            Box::new(ScreenDetector::from_config(config)),
            Box::new(UnloadDetector::new()),
        ])
    }

    pub fn start_all(
        &mut self,
        page: &PageState,
        now: DateTime<Utc>,
    ) -> Vec<(DetectorKind, DetectorSignal)> {
        let mut signals = Vec::new();
        for monitor in &mut self.monitors {
            let kind = monitor.kind();
            for signal in monitor.start(&mut self.hub, page, now) {
                signals.push((kind, signal));
            }
        }
        signals
    }

    pub fn stop_all(&mut self) {
        for monitor in &mut self.monitors {
            monitor.stop(&mut self.hub);
        }
    }

    pub fn start(
        &mut self,
        kind: DetectorKind,
        page: &PageState,
        now: DateTime<Utc>,
    ) -> Vec<DetectorSignal> {
        match self.monitors.iter_mut().find(|m| m.kind() == kind) {
            Some(monitor) => monitor.start(&mut self.hub, page, now),
            None => Vec::new(),
        }
    }

    pub fn stop(&mut self, kind: DetectorKind) {
        if let Some(monitor) = self.monitors.iter_mut().find(|m| m.kind() == kind) {
            monitor.stop(&mut self.hub);
        }
    }

    /// Delivers `event` to every detector registered for its topic.
    pub fn dispatch(
        &mut self,
        event: &PageEvent,
        page: &PageState,
        now: DateTime<Utc>,
    ) -> Vec<(DetectorKind, DetectorSignal)> {
        let mut signals = Vec::new();
        for owner in self.hub.owners_for(event.topic()) {
            let Some(monitor) = self.monitors.iter_mut().find(|m| m.kind() == owner) else {
                continue;
            };
            if !monitor.is_active() {
                continue;
            }
            for signal in monitor.detector.on_event(event, page, now) {
                signals.push((owner, signal));
            }
        }
        signals
    }

    pub fn is_active(&self, kind: DetectorKind) -> bool {
        self.monitors
            .iter()
            .any(|monitor| monitor.kind() == kind && monitor.is_active())
    }

    pub fn any_active(&self) -> bool {
        self.monitors.iter().any(Monitor::is_active)
    }

    pub fn hub(&self) -> &EventHub {
        &self.hub
    }
}
