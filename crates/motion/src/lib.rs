//! Presentation timing for the landing page: the once-per-session intro
//! overlay and the custom cursor's hover scaling.

pub mod cursor;
pub mod ease;
pub mod environment;
pub mod intro;
pub mod timeline;

pub use cursor::{CursorScale, HoverHandle, HoverRegistry};
pub use environment::{
    Element, EnvironmentError, IntroEnvironment, Rect, RecordingEnvironment, VisualMutation,
    SESSION_FLAG_KEY,
};
pub use intro::{intro_timeline, IntroCue, IntroEvent, IntroSequencer, Phase};
pub use timeline::{Placement, Step, Timeline, TimelineDriver, TimelineEvent};
