//! Once-per-session intro overlay.
//!
//! On mount the sequencer either skips (flag already set, flag unreadable, or
//! reduced motion requested) or plays a counter, name and welcome message,
//! then flies the name onto the page heading while the overlay splits open.
//! Playback is driven by [`IntroSequencer::tick`]; signals come back as
//! [`IntroEvent`]s in the order they happened.

use std::time::Duration;

use tracing::{debug, warn};

use crate::{
    ease::Ease,
    environment::{Element, IntroEnvironment, Rect, VisualMutation},
    timeline::{Placement, Step, Timeline, TimelineDriver, TimelineEvent},
};

const COUNT: Duration = Duration::from_millis(1_400);
const COUNTER_HOLD: Duration = Duration::from_millis(400);
const COUNTER_FADE: Duration = Duration::from_millis(400);
const NAME_IN: Duration = Duration::from_millis(1_000);
const MESSAGE_IN: Duration = Duration::from_millis(800);
const MESSAGE_OVERLAP: Duration = Duration::from_millis(200);
const MESSAGE_HOLD: Duration = Duration::from_millis(800);
const MESSAGE_OUT: Duration = Duration::from_millis(300);
const FLY: Duration = Duration::from_millis(900);
const SPLIT: Duration = Duration::from_millis(800);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Mounted without its overlay elements; nothing is scheduled.
    Idle,
    Skipped,
    Counting,
    Naming,
    Messaging,
    Handoff,
    Transitioning,
    Complete,
}

impl Phase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Skipped | Self::Complete)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntroEvent {
    PhaseChanged(Phase),
    /// The page heading should hide its own copy of the name.
    Prepare,
    /// The overlay is gone and the page is interactive. Sent once.
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntroCue {
    CounterReveal,
    Count,
    CounterHold,
    CounterFade,
    NameIn,
    MessageIn,
    MessageHold,
    MessageOut,
    Prepare,
    Fly,
    Split,
    Finish,
}

/// The intro timeline. Without a target the name stays put and the overlay
/// only splits open.
pub fn intro_timeline(with_target: bool) -> Timeline<IntroCue> {
    let mut timeline = Timeline::new();
    timeline
        .push(Step::instant(IntroCue::CounterReveal, "counter reveal"))
        .push(Step::new(IntroCue::Count, "count", COUNT))
        .push(Step::new(IntroCue::CounterHold, "counter hold", COUNTER_HOLD))
        .push(Step::new(IntroCue::CounterFade, "counter fade", COUNTER_FADE))
        .push(Step::new(IntroCue::NameIn, "name in", NAME_IN))
        .push(
            Step::new(IntroCue::MessageIn, "message in", MESSAGE_IN)
                .placed(Placement::Overlap(MESSAGE_OVERLAP)),
        )
        .push(Step::new(IntroCue::MessageHold, "message hold", MESSAGE_HOLD))
        .push(Step::new(IntroCue::MessageOut, "message out", MESSAGE_OUT))
        .push(Step::instant(IntroCue::Prepare, "prepare"));

    if with_target {
        timeline
            .push(Step::new(IntroCue::Fly, "fly to heading", FLY))
            .push(Step::new(IntroCue::Split, "split", SPLIT).placed(Placement::WithPrevious));
    } else {
        timeline.push(Step::new(IntroCue::Split, "split", SPLIT));
    }

    timeline.push(Step::instant(IntroCue::Finish, "complete"));
    timeline
}

pub struct IntroSequencer<E: IntroEnvironment> {
    env: E,
    driver: Option<TimelineDriver<IntroCue>>,
    phase: Phase,
    visible: bool,
    scroll_locked: bool,
    completed: bool,
    counter_percent: Option<u32>,
    fly: Option<(Rect, Rect)>,
    pending: Vec<IntroEvent>,
}

impl<E: IntroEnvironment> IntroSequencer<E> {
    /// Decides between skipping and playing, and runs the zero-time steps.
    /// Events raised here are returned by the next [`Self::take_events`] or
    /// [`Self::tick`].
    pub fn mount(env: E) -> Self {
        let mut sequencer = Self {
            env,
            driver: None,
            phase: Phase::Idle,
            visible: false,
            scroll_locked: false,
            completed: false,
            counter_percent: None,
            fly: None,
            pending: Vec::new(),
        };
        sequencer.start();
        sequencer
    }

    fn start(&mut self) {
        match self.env.read_played_flag() {
            Ok(true) => {
                debug!("intro already played this session");
                self.skip();
                return;
            }
            Ok(false) => {}
            Err(error) => {
                warn!(%error, "session flag unreadable; skipping intro");
                self.skip();
                return;
            }
        }

        if self.env.prefers_reduced_motion() {
            self.write_flag();
            self.skip();
            return;
        }

        if !self.env.overlay_mounted() {
            debug!("intro overlay not mounted; nothing to animate");
            return;
        }

        let with_target = self.env.locate_target().is_some();
        self.env.lock_scroll();
        self.scroll_locked = true;
        self.visible = true;
        self.env.apply(VisualMutation::OverlayVisible(true));
        self.enter(Phase::Counting);

        let mut driver = TimelineDriver::new(intro_timeline(with_target));
        let events = driver.tick(Duration::ZERO);
        self.driver = Some(driver);
        self.handle(events);
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_complete(&self) -> bool {
        self.completed
    }

    pub fn env(&self) -> &E {
        &self.env
    }

    pub fn take_events(&mut self) -> Vec<IntroEvent> {
        std::mem::take(&mut self.pending)
    }

    /// Advances playback by `delta` and returns every signal raised so far.
    pub fn tick(&mut self, delta: Duration) -> Vec<IntroEvent> {
        if self.phase.is_terminal() {
            return self.take_events();
        }
        if let Some(driver) = self.driver.as_mut() {
            let events = driver.tick(delta);
            self.handle(events);
        }
        self.take_events()
    }

    /// Stops playback, removes the overlay and gives scrolling back.
    /// `Complete` is not sent for a cancelled intro.
    pub fn cancel(&mut self) {
        if let Some(driver) = self.driver.as_mut() {
            if !driver.is_finished() {
                debug!(phase = ?self.phase, "intro cancelled");
            }
            driver.cancel();
        }
        self.release_scroll();
        if self.visible {
            self.visible = false;
            self.env.apply(VisualMutation::OverlayVisible(false));
        }
    }

    fn handle(&mut self, events: Vec<TimelineEvent<IntroCue>>) {
        for event in events {
            match event {
                TimelineEvent::Started(cue) => self.on_start(cue),
                TimelineEvent::Progress { key, progress } => self.on_progress(key, progress),
                TimelineEvent::Finished(_) | TimelineEvent::Completed => {}
            }
        }
    }

    fn on_start(&mut self, cue: IntroCue) {
        match cue {
            IntroCue::CounterReveal => self.env.apply(VisualMutation::Opacity {
                element: Element::Counter,
                value: 1.0,
            }),
            IntroCue::NameIn => self.enter(Phase::Naming),
            IntroCue::MessageIn => self.enter(Phase::Messaging),
            IntroCue::MessageOut => self.enter(Phase::Handoff),
            IntroCue::Prepare => {
                self.write_flag();
                self.pending.push(IntroEvent::Prepare);
            }
            IntroCue::Fly => {
                let from = self.env.capture_name_rect();
                let to = self.env.locate_target().unwrap_or(from);
                self.fly = Some((from, to));
                self.enter(Phase::Transitioning);
                self.env.apply(VisualMutation::Pin {
                    element: Element::Name,
                    rect: from,
                });
            }
            IntroCue::Finish => self.finish(),
            IntroCue::Count
            | IntroCue::CounterHold
            | IntroCue::CounterFade
            | IntroCue::MessageHold
            | IntroCue::Split => {}
        }
    }

    fn on_progress(&mut self, cue: IntroCue, progress: f32) {
        match cue {
            IntroCue::Count => {
                let percent = (Ease::CubicInOut.apply(progress) * 100.0).round() as u32;
                if self.counter_percent != Some(percent) {
                    self.counter_percent = Some(percent);
                    self.env
                        .apply(VisualMutation::CounterText(format!("{percent}%")));
                }
            }
            IntroCue::CounterFade => self.env.apply(VisualMutation::Opacity {
                element: Element::Counter,
                value: 1.0 - Ease::CubicIn.apply(progress),
            }),
            IntroCue::NameIn => self.rise(Element::Name, progress, Ease::BackOut(1.2), 50.0, 0.9),
            IntroCue::MessageIn => {
                self.rise(Element::Message, progress, Ease::BackOut(1.4), 40.0, 0.95)
            }
            IntroCue::MessageOut => self.env.apply(VisualMutation::Opacity {
                element: Element::Message,
                value: 1.0 - Ease::CubicIn.apply(progress),
            }),
            IntroCue::Fly => {
                if let Some((from, to)) = self.fly {
                    self.env.apply(VisualMutation::Pin {
                        element: Element::Name,
                        rect: from.lerp(to, Ease::QuartInOut.apply(progress)),
                    });
                }
            }
            IntroCue::Split => {
                let eased = Ease::QuartInOut.apply(progress);
                self.env.apply(VisualMutation::Slide {
                    element: Element::TopHalf,
                    y_percent: -100.0 * eased,
                });
                self.env.apply(VisualMutation::Slide {
                    element: Element::BottomHalf,
                    y_percent: 100.0 * eased,
                });
            }
            IntroCue::CounterReveal
            | IntroCue::CounterHold
            | IntroCue::MessageHold
            | IntroCue::Prepare
            | IntroCue::Finish => {}
        }
    }

    fn rise(&mut self, element: Element, progress: f32, ease: Ease, from_y: f32, from_scale: f32) {
        let eased = ease.apply(progress);
        self.env.apply(VisualMutation::Opacity {
            element,
            value: eased.clamp(0.0, 1.0),
        });
        self.env.apply(VisualMutation::Rise {
            element,
            offset_y: from_y * (1.0 - eased),
            scale: from_scale + (1.0 - from_scale) * eased,
        });
    }

    fn finish(&mut self) {
        self.enter(Phase::Complete);
        self.emit_complete();
        if self.fly.is_some() {
            self.env.apply(VisualMutation::Opacity {
                element: Element::Name,
                value: 0.0,
            });
        }
        self.release_scroll();
        self.visible = false;
        self.env.apply(VisualMutation::OverlayVisible(false));
    }

    fn skip(&mut self) {
        self.enter(Phase::Skipped);
        self.emit_complete();
    }

    fn enter(&mut self, phase: Phase) {
        let elapsed_ms = self
            .driver
            .as_ref()
            .map_or(0, |driver| driver.elapsed().as_millis() as u64);
        debug!(?phase, elapsed_ms, "intro phase");
        self.phase = phase;
        self.pending.push(IntroEvent::PhaseChanged(phase));
    }

    fn emit_complete(&mut self) {
        if !self.completed {
            self.completed = true;
            self.pending.push(IntroEvent::Complete);
        }
    }

    fn write_flag(&mut self) {
        if let Err(error) = self.env.write_played_flag() {
            debug!(%error, "could not record intro as played");
        }
    }

    fn release_scroll(&mut self) {
        if self.scroll_locked {
            self.scroll_locked = false;
            self.env.unlock_scroll();
        }
    }
}

impl<E: IntroEnvironment> Drop for IntroSequencer<E> {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
#[path = "tests/intro_tests.rs"]
mod tests;
