use super::*;

fn ms(value: u64) -> Duration {
    Duration::from_millis(value)
}

fn sample() -> Timeline<u8> {
    let mut timeline = Timeline::new();
    timeline
        .push(Step::instant(0, "reveal"))
        .push(Step::new(1, "count", ms(1_000)))
        .push(Step::new(2, "name", ms(500)))
        .push(Step::new(3, "message", ms(400)).placed(Placement::Overlap(ms(100))))
        .push(Step::new(4, "split", ms(300)).placed(Placement::WithPrevious))
        .push(Step::instant(5, "done"));
    timeline
}

#[test]
fn placements_resolve_start_times() {
    let timeline = sample();
    let starts: Vec<_> = timeline.steps().iter().map(|s| (s.step.label, s.start)).collect();

    assert_eq!(
        starts,
        vec![
            ("reveal", ms(0)),
            ("count", ms(0)),
            ("name", ms(1_000)),
            ("message", ms(1_400)),
            ("split", ms(1_400)),
            ("done", ms(1_800)),
        ]
    );
    assert_eq!(timeline.total_duration(), ms(1_800));
}

#[test]
fn overlap_never_starts_before_zero() {
    let mut timeline = Timeline::new();
    timeline.push(Step::new('a', "a", ms(100)).placed(Placement::Overlap(ms(500))));
    assert_eq!(timeline.steps()[0].start, Duration::ZERO);
}

#[test]
fn zero_tick_fires_instant_steps() {
    let mut driver = TimelineDriver::new(sample());
    let events = driver.tick(Duration::ZERO);

    assert_eq!(
        events,
        vec![
            TimelineEvent::Started(0),
            TimelineEvent::Finished(0),
            TimelineEvent::Started(1),
            TimelineEvent::Progress {
                key: 1,
                progress: 0.0
            },
        ]
    );
}

#[test]
fn progress_reported_per_tick() {
    let mut driver = TimelineDriver::new(sample());
    driver.tick(Duration::ZERO);

    let events = driver.tick(ms(250));
    assert_eq!(
        events,
        vec![TimelineEvent::Progress {
            key: 1,
            progress: 0.25
        }]
    );
}

#[test]
fn large_tick_reports_events_in_timeline_order() {
    let mut driver = TimelineDriver::new(sample());
    let events = driver.tick(ms(5_000));

    let order: Vec<_> = events
        .iter()
        .filter_map(|event| match event {
            TimelineEvent::Started(key) => Some(format!("start {key}")),
            TimelineEvent::Finished(key) => Some(format!("end {key}")),
            TimelineEvent::Completed => Some("completed".to_string()),
            TimelineEvent::Progress { .. } => None,
        })
        .collect();

    assert_eq!(
        order,
        vec![
            "start 0", "end 0", "start 1", "end 1", "start 2", "start 3", "start 4", "end 2",
            "end 4", "end 3", "start 5", "end 5", "completed",
        ]
    );
    assert!(driver.is_finished());
}

#[test]
fn completed_is_reported_once() {
    let mut driver = TimelineDriver::new(sample());
    let first = driver.tick(ms(2_000));
    let second = driver.tick(ms(2_000));

    assert_eq!(first.last(), Some(&TimelineEvent::Completed));
    assert!(second.is_empty());
}

#[test]
fn finished_steps_report_full_progress() {
    let mut driver = TimelineDriver::new(sample());
    let events = driver.tick(ms(1_200));

    assert!(events.contains(&TimelineEvent::Progress {
        key: 1,
        progress: 1.0
    }));
    assert!(events.contains(&TimelineEvent::Finished(1)));
}

#[test]
fn cancel_stops_all_further_events() {
    let mut driver = TimelineDriver::new(sample());
    driver.tick(ms(300));
    driver.cancel();

    assert!(driver.is_cancelled());
    assert!(driver.tick(ms(10_000)).is_empty());
}
