//! Live monitoring loop: one simulated reading per tick, a rolling history, metric cards
//! with deltas, and a redraw hook.

use crate::plotting;
use anyhow::{Context, Result};
use aquaforge_core::simulation::{engine::LiveSimulator, state::HistoryBuffer};
use aquaforge_schemas::reading::{Parameter, TIMESTAMP_FORMAT};
use chrono::{NaiveDateTime, SubsecRound};
use serde::Serialize;
use std::{
    fs,
    path::Path,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};
use tokio::{
    sync::Notify,
    time::{interval, MissedTickBehavior},
};
use tracing::{debug, info, warn};

/// The six cards shown above the charts, with their display precision.
const CARDS: [(Parameter, &str, usize); 6] = [
    (Parameter::Ph, "pH", 2),
    (Parameter::DissolvedOxygen, "Oxygen (mg/L)", 2),
    (Parameter::AmbientTemperature, "Ambient Temp (°C)", 2),
    (Parameter::AmbientHumidity, "Humidity (%)", 1),
    (Parameter::WaterTemperature, "Water Temp (°C)", 1),
    (Parameter::FeedQuantity, "Feed (g)", 1),
];

/// Cooperative stop signal shared between the loop and whoever wants to end it.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    signal: Arc<Notify>,
    triggered: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        info!("Cancelling live dashboard");
        self.triggered.store(true, Ordering::SeqCst);
        self.signal.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.triggered.load(Ordering::SeqCst)
    }

    /// Resolves once [`cancel`](Self::cancel) has been called, including before the wait began.
    pub async fn cancelled(&self) {
        loop {
            let notified = self.signal.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricCard {
    pub parameter: Parameter,
    pub label: &'static str,
    pub value: f64,
    pub delta: f64,
    pub precision: usize,
}

impl MetricCard {
    pub fn display(&self) -> String {
        format!(
            "{}: {:.p$} ({:+.p$})",
            self.label,
            self.value,
            self.delta,
            p = self.precision
        )
    }
}

/// Everything one tick produced.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardFrame {
    pub tick: u64,
    pub timestamp: String,
    pub cards: Vec<MetricCard>,
    pub history_len: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    pub ticks: u64,
    pub samples_retained: usize,
    pub first_timestamp: Option<String>,
    pub last_timestamp: Option<String>,
}

/// State of one display session. Owned by the loop and consumed by [`close`](Self::close).
pub struct DashboardSession {
    simulator: LiveSimulator,
    history: HistoryBuffer,
}

impl DashboardSession {
    pub fn new(simulator: LiveSimulator, history: HistoryBuffer) -> Self {
        Self { simulator, history }
    }

    /// Simulates one reading at `now`, records it and builds the metric cards.
    pub fn update(&mut self, now: NaiveDateTime) -> DashboardFrame {
        let reading = self.simulator.next_reading(now);
        self.history.push(reading);

        let latest = self.history.latest();
        let cards = CARDS
            .iter()
            .filter_map(|&(parameter, label, precision)| {
                let value = latest.and_then(|r| r.value(parameter))?;
                Some(MetricCard {
                    parameter,
                    label,
                    value,
                    delta: self.history.delta(parameter),
                    precision,
                })
            })
            .collect();

        DashboardFrame {
            tick: self.simulator.get_tick(),
            timestamp: now.format(TIMESTAMP_FORMAT).to_string(),
            cards,
            history_len: self.history.len(),
        }
    }

    pub fn history(&self) -> &HistoryBuffer {
        &self.history
    }

    pub fn ticks(&self) -> u64 {
        self.simulator.get_tick()
    }

    pub fn close(self) -> SessionSummary {
        let stamp = |ts: NaiveDateTime| ts.format(TIMESTAMP_FORMAT).to_string();
        let summary = SessionSummary {
            ticks: self.simulator.get_tick(),
            samples_retained: self.history.len(),
            first_timestamp: self.history.iter().next().map(|r| stamp(r.timestamp)),
            last_timestamp: self.history.latest().map(|r| stamp(r.timestamp)),
        };
        info!(
            ticks = summary.ticks,
            retained = summary.samples_retained,
            "dashboard session closed"
        );
        summary
    }
}

/// Runs the timed loop until the token is cancelled or `max_ticks` updates have happened.
///
/// Ticks never overlap: `render` runs to completion before the next wait starts. A
/// render error ends the session and is returned to the caller.
pub async fn run_live_dashboard<F>(
    mut session: DashboardSession,
    period: Duration,
    token: CancellationToken,
    max_ticks: Option<u64>,
    mut render: F,
) -> Result<SessionSummary>
where
    F: FnMut(&DashboardFrame, &HistoryBuffer) -> Result<()>,
{
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        if max_ticks.is_some_and(|limit| session.ticks() >= limit) {
            debug!("tick limit reached");
            break;
        }
        tokio::select! {
            biased;
            _ = token.cancelled() => {
                info!("Received shutdown signal, stopping dashboard");
                break;
            }
            _ = ticker.tick() => {
                let now = chrono::Local::now().naive_local().trunc_subsecs(0);
                let frame = session.update(now);
                if let Err(e) = render(&frame, session.history()) {
                    warn!(tick = frame.tick, "render failed, closing session");
                    session.close();
                    return Err(e);
                }
            }
        }
    }

    Ok(session.close())
}

/// Default redraw: metric cards on stdout, chart grid PNG and a JSON snapshot on disk.
/// The chart is skipped while the history is still empty.
pub fn render_frame(
    output_dir: &str,
    frame: &DashboardFrame,
    history: &HistoryBuffer,
) -> Result<()> {
    let line: Vec<String> = frame.cards.iter().map(MetricCard::display).collect();
    println!("[{}] #{} | {}", frame.timestamp, frame.tick, line.join(" | "));

    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create dashboard directory: {}", output_dir))?;
    if !history.is_empty() {
        plotting::draw_live_dashboard(output_dir, history)?;
    }

    let snapshot_path = Path::new(output_dir).join("latest_frame.json");
    let json = serde_json::to_string_pretty(frame).context("Failed to serialize dashboard frame")?;
    fs::write(&snapshot_path, json)
        .with_context(|| format!("Failed to write snapshot: {:?}", snapshot_path))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use aquaforge_core::simulation::builder::LiveSimulatorBuilder;
    use aquaforge_schemas::profile::LiveProfile;
    use chrono::NaiveDate;

    fn session(capacity: usize) -> DashboardSession {
        let simulator = LiveSimulatorBuilder::from_profile(&LiveProfile::default())
            .with_seed(11)
            .build()
            .unwrap();
        DashboardSession::new(simulator, HistoryBuffer::new(capacity).unwrap())
    }

    fn at(second: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap().and_hms_opt(12, 0, second).unwrap()
    }

    #[test]
    fn first_frame_has_zero_deltas() {
        let mut session = session(10);
        let frame = session.update(at(0));
        assert_eq!(frame.tick, 1);
        assert_eq!(frame.cards.len(), 6);
        assert!(frame.cards.iter().all(|c| c.delta == 0.0));
        assert_eq!(frame.timestamp, "2024-06-01 12:00:00");
    }

    #[test]
    fn deltas_compare_the_last_two_samples() {
        let mut session = session(10);
        session.update(at(0));
        let frame = session.update(at(3));
        let history = session.history();
        let ph = frame.cards.iter().find(|c| c.parameter == Parameter::Ph).unwrap();
        let expected = history.latest().unwrap().value(Parameter::Ph).unwrap()
            - history.previous().unwrap().value(Parameter::Ph).unwrap();
        assert!((ph.delta - expected).abs() < 1e-12);
    }

    #[test]
    fn close_summarises_the_retained_window() {
        let mut session = session(3);
        for s in 0..5 {
            session.update(at(s));
        }
        let summary = session.close();
        assert_eq!(summary.ticks, 5);
        assert_eq!(summary.samples_retained, 3);
        assert_eq!(summary.first_timestamp.as_deref(), Some("2024-06-01 12:00:02"));
        assert_eq!(summary.last_timestamp.as_deref(), Some("2024-06-01 12:00:04"));
    }

    #[test]
    fn card_display_respects_precision() {
        let card = MetricCard {
            parameter: Parameter::AmbientHumidity,
            label: "Humidity (%)",
            value: 64.987,
            delta: -1.04,
            precision: 1,
        };
        assert_eq!(card.display(), "Humidity (%): 65.0 (-1.0)");
    }

    #[tokio::test]
    async fn loop_stops_at_the_tick_limit() {
        let mut seen = Vec::new();
        let summary = run_live_dashboard(
            session(2),
            Duration::from_millis(1),
            CancellationToken::new(),
            Some(4),
            |frame, history| {
                assert!(history.len() <= 2);
                seen.push(frame.tick);
                Ok(())
            },
        )
        .await
        .unwrap();
        assert_eq!(seen, vec![1, 2, 3, 4]);
        assert_eq!(summary.ticks, 4);
        assert_eq!(summary.samples_retained, 2);
    }

    #[tokio::test]
    async fn cancelled_token_stops_before_the_first_tick() {
        let token = CancellationToken::new();
        token.cancel();
        let summary =
            run_live_dashboard(session(5), Duration::from_millis(1), token, None, |_, _| Ok(()))
                .await
                .unwrap();
        assert_eq!(summary.ticks, 0);
        assert_eq!(summary.last_timestamp, None);
    }

    #[test]
    fn ticks_follow_the_simulator() {
        let mut session = session(2);
        assert_eq!(session.ticks(), 0);
        for s in 0..3 {
            session.update(at(s));
        }
        assert_eq!(session.ticks(), 3);
        assert_eq!(session.history().len(), 2);
    }

    #[test]
    fn empty_history_writes_only_the_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let output_dir = dir.path().to_str().unwrap();
        let frame = DashboardFrame {
            tick: 0,
            timestamp: "2024-06-01 12:00:00".to_string(),
            cards: Vec::new(),
            history_len: 0,
        };
        render_frame(output_dir, &frame, &HistoryBuffer::new(4).unwrap()).unwrap();
        assert!(dir.path().join("latest_frame.json").is_file());
        assert!(!dir.path().join("live_dashboard.png").exists());
    }

    #[tokio::test]
    async fn render_error_ends_the_loop() {
        let result = run_live_dashboard(
            session(5),
            Duration::from_millis(1),
            CancellationToken::new(),
            None,
            |frame, _| {
                if frame.tick == 2 {
                    anyhow::bail!("disk full");
                }
                Ok(())
            },
        )
        .await;
        assert!(result.is_err());
    }
}
