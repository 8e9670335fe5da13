//! The host page as seen by the intro sequencer.

use std::collections::BTreeMap;

use thiserror::Error;

/// Session storage key marking the intro as played.
pub const SESSION_FLAG_KEY: &str = "portfolio-loaded";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvironmentError {
    #[error("session storage unavailable: {0}")]
    StorageUnavailable(String),
}

/// Screen-space rectangle in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub top: f32,
    pub left: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(top: f32, left: f32, width: f32, height: f32) -> Self {
        Self {
            top,
            left,
            width,
            height,
        }
    }

    #[must_use]
    pub fn lerp(self, to: Rect, t: f32) -> Rect {
        let mix = |a: f32, b: f32| a + (b - a) * t;
        Rect {
            top: mix(self.top, to.top),
            left: mix(self.left, to.left),
            width: mix(self.width, to.width),
            height: mix(self.height, to.height),
        }
    }
}

/// Overlay parts the sequencer animates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Element {
    Counter,
    Name,
    Message,
    TopHalf,
    BottomHalf,
}

#[derive(Debug, Clone, PartialEq)]
pub enum VisualMutation {
    OverlayVisible(bool),
    CounterText(String),
    Opacity {
        element: Element,
        value: f32,
    },
    /// Vertical offset in pixels and uniform scale, relative to the resting layout.
    Rise {
        element: Element,
        offset_y: f32,
        scale: f32,
    },
    /// Fixed-position placement at an absolute rectangle.
    Pin {
        element: Element,
        rect: Rect,
    },
    /// Vertical translation as a percentage of the element's own height.
    Slide {
        element: Element,
        y_percent: f32,
    },
}

/// Everything the sequencer reads from or writes to the page.
pub trait IntroEnvironment {
    fn read_played_flag(&self) -> Result<bool, EnvironmentError>;
    fn write_played_flag(&mut self) -> Result<(), EnvironmentError>;
    fn prefers_reduced_motion(&self) -> bool;
    fn lock_scroll(&mut self);
    fn unlock_scroll(&mut self);
    /// Whether every overlay element the timeline animates is mounted.
    fn overlay_mounted(&self) -> bool;
    /// Current rectangle of the page heading the name flies to, if present.
    fn locate_target(&self) -> Option<Rect>;
    /// Current rectangle of the overlay's name element.
    fn capture_name_rect(&self) -> Rect;
    fn apply(&mut self, mutation: VisualMutation);
}

impl<E: IntroEnvironment + ?Sized> IntroEnvironment for &mut E {
    fn read_played_flag(&self) -> Result<bool, EnvironmentError> {
        (**self).read_played_flag()
    }

    fn write_played_flag(&mut self) -> Result<(), EnvironmentError> {
        (**self).write_played_flag()
    }

    fn prefers_reduced_motion(&self) -> bool {
        (**self).prefers_reduced_motion()
    }

    fn lock_scroll(&mut self) {
        (**self).lock_scroll();
    }

    fn unlock_scroll(&mut self) {
        (**self).unlock_scroll();
    }

    fn overlay_mounted(&self) -> bool {
        (**self).overlay_mounted()
    }

    fn locate_target(&self) -> Option<Rect> {
        (**self).locate_target()
    }

    fn capture_name_rect(&self) -> Rect {
        (**self).capture_name_rect()
    }

    fn apply(&mut self, mutation: VisualMutation) {
        (**self).apply(mutation);
    }
}

/// In-memory page that records every call made against it.
#[derive(Debug, Clone)]
pub struct RecordingEnvironment {
    pub session: BTreeMap<String, String>,
    pub storage_unavailable: bool,
    pub reduced_motion: bool,
    pub overlay_mounted: bool,
    pub target: Option<Rect>,
    pub name_rect: Rect,
    pub scroll_locked: bool,
    pub scroll_locks: u32,
    pub flag_writes: u32,
    pub mutations: Vec<VisualMutation>,
}

impl RecordingEnvironment {
    /// A fresh session: flag unset, full motion, overlay mounted, no target.
    pub fn new() -> Self {
        Self {
            session: BTreeMap::new(),
            storage_unavailable: false,
            reduced_motion: false,
            overlay_mounted: true,
            target: None,
            name_rect: Rect::new(360.0, 420.0, 440.0, 96.0),
            scroll_locked: false,
            scroll_locks: 0,
            flag_writes: 0,
            mutations: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_played_flag(mut self) -> Self {
        self.session
            .insert(SESSION_FLAG_KEY.to_string(), "true".to_string());
        self
    }

    pub fn played(&self) -> bool {
        self.session.get(SESSION_FLAG_KEY).map(String::as_str) == Some("true")
    }

    #[must_use]
    pub fn with_target(mut self, target: Rect) -> Self {
        self.target = Some(target);
        self
    }

    /// True if any opacity, offset, placement or slide change was applied.
    pub fn animated(&self) -> bool {
        self.mutations.iter().any(|mutation| {
            !matches!(
                mutation,
                VisualMutation::OverlayVisible(_) | VisualMutation::CounterText(_)
            )
        })
    }

    pub fn counter_texts(&self) -> Vec<&str> {
        self.mutations
            .iter()
            .filter_map(|mutation| match mutation {
                VisualMutation::CounterText(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn last_pin(&self, element: Element) -> Option<Rect> {
        self.mutations.iter().rev().find_map(|mutation| match mutation {
            VisualMutation::Pin { element: pinned, rect } if *pinned == element => Some(*rect),
            _ => None,
        })
    }
}

impl Default for RecordingEnvironment {
    fn default() -> Self {
        Self::new()
    }
}

impl IntroEnvironment for RecordingEnvironment {
    fn read_played_flag(&self) -> Result<bool, EnvironmentError> {
        if self.storage_unavailable {
            return Err(EnvironmentError::StorageUnavailable(
                "access denied".to_string(),
            ));
        }
        Ok(self.played())
    }

    fn write_played_flag(&mut self) -> Result<(), EnvironmentError> {
        self.flag_writes += 1;
        if self.storage_unavailable {
            return Err(EnvironmentError::StorageUnavailable(
                "access denied".to_string(),
            ));
        }
        self.session
            .insert(SESSION_FLAG_KEY.to_string(), "true".to_string());
        Ok(())
    }

    fn prefers_reduced_motion(&self) -> bool {
        self.reduced_motion
    }

    fn lock_scroll(&mut self) {
        self.scroll_locked = true;
        self.scroll_locks += 1;
    }

    fn unlock_scroll(&mut self) {
        self.scroll_locked = false;
    }

    fn overlay_mounted(&self) -> bool {
        self.overlay_mounted
    }

    fn locate_target(&self) -> Option<Rect> {
        self.target
    }

    fn capture_name_rect(&self) -> Rect {
        self.name_rect
    }

    fn apply(&mut self, mutation: VisualMutation) {
        self.mutations.push(mutation);
    }
}
