//! Hover tracking for the custom cursor.
//!
//! Interactive components register once, forward their pointer enter/leave
//! events, and unregister when they unmount.

use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HoverHandle(u64);

/// Transform targets for the cursor dot and its trailing follower.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CursorScale {
    pub cursor: f32,
    pub follower: f32,
    pub follower_opacity: f32,
}

impl CursorScale {
    pub const IDLE: Self = Self {
        cursor: 1.0,
        follower: 1.0,
        follower_opacity: 0.3,
    };

    pub const HOVERING: Self = Self {
        cursor: 0.5,
        follower: 1.8,
        follower_opacity: 0.5,
    };
}

#[derive(Debug, Default)]
pub struct HoverRegistry {
    next_id: u64,
    registered: BTreeSet<HoverHandle>,
    hovered: BTreeSet<HoverHandle>,
}

impl HoverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self) -> HoverHandle {
        let handle = HoverHandle(self.next_id);
        self.next_id += 1;
        self.registered.insert(handle);
        handle
    }

    /// Drops the handle. A handle that was hovered stops counting.
    pub fn unregister(&mut self, handle: HoverHandle) -> bool {
        self.hovered.remove(&handle);
        self.registered.remove(&handle)
    }

    /// Returns the scale to animate towards. Unknown handles are ignored.
    pub fn enter(&mut self, handle: HoverHandle) -> CursorScale {
        if self.registered.contains(&handle) {
            self.hovered.insert(handle);
        }
        self.scale()
    }

    pub fn leave(&mut self, handle: HoverHandle) -> CursorScale {
        self.hovered.remove(&handle);
        self.scale()
    }

    pub fn depth(&self) -> usize {
        self.hovered.len()
    }

    pub fn registered(&self) -> usize {
        self.registered.len()
    }

    pub fn scale(&self) -> CursorScale {
        if self.hovered.is_empty() {
            CursorScale::IDLE
        } else {
            CursorScale::HOVERING
        }
    }
}

#[cfg(test)]
#[path = "tests/cursor_tests.rs"]
mod tests;
