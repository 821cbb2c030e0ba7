use post_task::{DelayTable, Host, Priority, Result, TaskScheduler, YieldMechanism, select_yield};
use post_task_local::{LocalHost, Profile};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

/// Something that ran during a simulation, and when.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub label: String,
    pub at: Duration,
}

/// The events observed while driving one stage of the loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage {
    pub name: &'static str,
    pub events: Vec<Event>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    /// `(what was posted, how it was routed)`, in posting order.
    pub routes: Vec<(String, String)>,
    pub stages: Vec<Stage>,
}

/// Posts one task per priority (most urgent first) and a pause, then drives
/// `LocalHost` stage by stage, recording what ran in each stage.
pub fn run(profile: Profile, delays: DelayTable) -> Result<Report> {
    let host = Rc::new(LocalHost::new(profile));
    let scheduler = TaskScheduler::new(host.clone()).with_delays(delays)?;
    let log: Rc<RefCell<Vec<Event>>> = Rc::default();

    let mut routes = Vec::new();
    let record = |label: String| {
        let log = log.clone();
        let host = host.clone();
        move || {
            log.borrow_mut().push(Event {
                label,
                at: host.now(),
            })
        }
    };

    for priority in [
        Priority::UserBlocking,
        Priority::UserVisible,
        Priority::Background,
    ] {
        routes.push((
            priority.to_string(),
            scheduler.mechanism_for(priority).to_string(),
        ));
        let _ = scheduler.post_task(record(priority.to_string()), priority);
    }

    let pause_route = match select_yield(&host.capabilities(), scheduler.delays()) {
        YieldMechanism::Yield => "native yield".to_string(),
        YieldMechanism::Post(mechanism) => mechanism.to_string(),
    };
    routes.push(("pause".to_string(), pause_route));
    let mut pause = Some(scheduler.pause_task());

    let drivers: [(&'static str, &dyn Fn(&LocalHost)); 5] = [
        ("inline", &|_| {}),
        ("microtasks", &|h| {
            h.run_microtasks();
        }),
        ("native", &|h| {
            h.run_native();
        }),
        ("timers due now", &|h| {
            h.advance(Duration::ZERO);
        }),
        ("until stalled", &|h| {
            h.run_until_stalled();
        }),
    ];

    let mut stages = Vec::new();
    for (name, drive) in drivers {
        drive(&*host);
        let mut events: Vec<Event> = log.borrow_mut().drain(..).collect();
        if pause
            .as_mut()
            .is_some_and(|handle| handle.try_resolved().is_some())
        {
            events.push(Event {
                label: "pause resolved".to_string(),
                at: host.now(),
            });
            pause = None;
        }
        stages.push(Stage { name, events });
    }

    tracing::debug!(executed = host.executed(), "simulation finished");
    Ok(Report { routes, stages })
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "routing:")?;
        for (what, how) in &self.routes {
            writeln!(f, "  {what:<14} -> {how}")?;
        }
        writeln!(f, "timeline:")?;
        for stage in &self.stages {
            if stage.events.is_empty() {
                writeln!(f, "  [{}] -", stage.name)?;
                continue;
            }
            let events: Vec<_> = stage
                .events
                .iter()
                .map(|e| format!("{} @{}ms", e.label, e.at.as_millis()))
                .collect();
            writeln!(f, "  [{}] {}", stage.name, events.join(", "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(report: &Report, stage: &str) -> Vec<String> {
        report
            .stages
            .iter()
            .find(|s| s.name == stage)
            .map(|s| s.events.iter().map(|e| e.label.clone()).collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_batch_runs_everything_inline() {
        let report = run(Profile::batch(), DelayTable::DEFAULT).unwrap();
        assert_eq!(
            labels(&report, "inline"),
            vec!["user-blocking", "user-visible", "background", "pause resolved"]
        );
        assert!(report.routes.iter().all(|(_, how)| how == "immediate"));
    }

    #[test]
    fn test_microtasks_profile_timeline() {
        let report = run(Profile::microtasks(), DelayTable::DEFAULT).unwrap();
        assert_eq!(labels(&report, "inline"), Vec::<String>::new());
        assert_eq!(labels(&report, "microtasks"), vec!["user-blocking"]);
        assert_eq!(
            labels(&report, "timers due now"),
            vec!["user-visible", "pause resolved"]
        );
        assert_eq!(labels(&report, "until stalled"), vec!["background"]);

        let background = &report.stages[4].events[0];
        assert_eq!(background.at, Duration::from_millis(150));
    }

    #[test]
    fn test_native_profile_routes() {
        let report = run(Profile::native(), DelayTable::DEFAULT).unwrap();
        assert_eq!(
            report.routes,
            vec![
                ("user-blocking".to_string(), "native(user-blocking)".to_string()),
                ("user-visible".to_string(), "native(user-visible)".to_string()),
                ("background".to_string(), "native(background)".to_string()),
                ("pause".to_string(), "native yield".to_string()),
            ]
        );
        assert_eq!(
            labels(&report, "native"),
            vec!["user-blocking", "user-visible", "background", "pause resolved"]
        );
    }

    #[test]
    fn test_report_display() {
        let text = run(Profile::timers(), DelayTable::DEFAULT)
            .unwrap()
            .to_string();
        assert!(text.contains("background     -> timer(delay=150ms)"));
        assert!(text.contains("[until stalled] background @150ms"));
    }
}
