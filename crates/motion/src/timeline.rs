//! Ordered steps with declared durations, advanced by elapsed-time ticks.

use std::time::Duration;

/// Where a step starts relative to the steps added before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// At the current end of the timeline.
    Sequential,
    /// Together with the previously added step.
    WithPrevious,
    /// Before the current end of the timeline by the given amount.
    Overlap(Duration),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step<K> {
    pub key: K,
    pub label: &'static str,
    pub duration: Duration,
    pub placement: Placement,
}

impl<K> Step<K> {
    pub fn new(key: K, label: &'static str, duration: Duration) -> Self {
        Self {
            key,
            label,
            duration,
            placement: Placement::Sequential,
        }
    }

    /// Zero-length step, used for callbacks and instant state changes.
    pub fn instant(key: K, label: &'static str) -> Self {
        Self::new(key, label, Duration::ZERO)
    }

    #[must_use]
    pub fn placed(mut self, placement: Placement) -> Self {
        self.placement = placement;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledStep<K> {
    pub step: Step<K>,
    pub start: Duration,
}

impl<K> ScheduledStep<K> {
    pub fn end(&self) -> Duration {
        self.start + self.step.duration
    }
}

#[derive(Debug, Clone)]
pub struct Timeline<K> {
    steps: Vec<ScheduledStep<K>>,
    end: Duration,
}

impl<K: Copy> Timeline<K> {
    pub fn new() -> Self {
        Self {
            steps: Vec::new(),
            end: Duration::ZERO,
        }
    }

    pub fn push(&mut self, step: Step<K>) -> &mut Self {
        let start = match step.placement {
            Placement::Sequential => self.end,
            Placement::WithPrevious => self.steps.last().map_or(self.end, |prev| prev.start),
            Placement::Overlap(by) => self.end.saturating_sub(by),
        };
        let scheduled = ScheduledStep { step, start };
        self.end = self.end.max(scheduled.end());
        self.steps.push(scheduled);
        self
    }

    pub fn steps(&self) -> &[ScheduledStep<K>] {
        &self.steps
    }

    pub fn total_duration(&self) -> Duration {
        self.end
    }
}

impl<K: Copy> Default for Timeline<K> {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimelineEvent<K> {
    Started(K),
    /// Linear progress in `0..=1`; reported once per tick for running steps.
    Progress { key: K, progress: f32 },
    Finished(K),
    /// Every step has finished. Reported once.
    Completed,
}

#[derive(Debug, Clone)]
struct Slot<K> {
    scheduled: ScheduledStep<K>,
    started: bool,
    finished: bool,
}

/// Plays a [`Timeline`]. Events from one tick are returned in the order they
/// happened on the timeline; ties are broken by insertion order.
#[derive(Debug, Clone)]
pub struct TimelineDriver<K> {
    slots: Vec<Slot<K>>,
    elapsed: Duration,
    completed: bool,
    cancelled: bool,
}

impl<K: Copy> TimelineDriver<K> {
    pub fn new(timeline: Timeline<K>) -> Self {
        let slots = timeline
            .steps
            .into_iter()
            .map(|scheduled| Slot {
                scheduled,
                started: false,
                finished: false,
            })
            .collect();
        Self {
            slots,
            elapsed: Duration::ZERO,
            completed: false,
            cancelled: false,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn is_finished(&self) -> bool {
        self.completed || self.cancelled
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Stops playback; later ticks report nothing.
    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    pub fn tick(&mut self, delta: Duration) -> Vec<TimelineEvent<K>> {
        if self.is_finished() {
            return Vec::new();
        }
        self.elapsed = self.elapsed.saturating_add(delta);
        let now = self.elapsed;

        let mut fired = Vec::new();
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.finished {
                continue;
            }
            let ScheduledStep { step, start } = slot.scheduled;
            let end = slot.scheduled.end();

            if !slot.started {
                if start > now {
                    continue;
                }
                slot.started = true;
                fired.push((start, index, 0_u8, TimelineEvent::Started(step.key)));
            }

            if !step.duration.is_zero() {
                let at = now.min(end);
                let progress = normalized_progress(at - start, step.duration);
                fired.push((
                    at,
                    index,
                    1,
                    TimelineEvent::Progress {
                        key: step.key,
                        progress,
                    },
                ));
            }

            if end <= now {
                slot.finished = true;
                fired.push((end, index, 2, TimelineEvent::Finished(step.key)));
            }
        }
        fired.sort_by_key(|(at, index, order, _)| (*at, *index, *order));

        let mut events: Vec<_> = fired.into_iter().map(|(_, _, _, event)| event).collect();
        if self.slots.iter().all(|slot| slot.finished) {
            self.completed = true;
            events.push(TimelineEvent::Completed);
        }
        events
    }
}

pub(crate) fn normalized_progress(elapsed: Duration, duration: Duration) -> f32 {
    if duration.is_zero() {
        return 1.0;
    }
    (elapsed.as_secs_f32() / duration.as_secs_f32()).clamp(0.0, 1.0)
}

#[cfg(test)]
#[path = "tests/timeline_tests.rs"]
mod tests;
