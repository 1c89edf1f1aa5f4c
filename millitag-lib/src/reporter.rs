//! The driver loop: steps the reporting state machine against the real
//! collaborators, with every suspension bounded by a configured timeout.
//!
//! Single-task, cooperative: one `Reporter` owns the frame builder (and with
//! it the cipher schedule and sequence counter), so frames are built and
//! transmitted strictly in sequence order. A new frame is never constructed
//! while a prior one's transmission is outstanding.

use std::time::Duration;

use chrono::Utc;
use tokio::time::{Instant, sleep, timeout};
use tracing::{debug, error, info, warn};

use crate::config::BeaconConfig;
use crate::error::BeaconError;
use crate::gps::FixSource;
use crate::machine::{Action, Event, ReportingState, RetryLimits, transition};
use crate::message::FrameBuilder;
use crate::net::Transport;
use crate::telemetry::{DeviceStatus, PositionFix};

/// How often the fix source is re-polled while acquiring.
const GPS_POLL_INTERVAL: Duration = Duration::from_millis(500);

pub struct Reporter<G, T> {
    config: BeaconConfig,
    builder: FrameBuilder,
    gps: G,
    transport: T,
    state: ReportingState,
    status: DeviceStatus,
    /// Fix held across transmit retries; cleared on success or skip.
    pending_fix: Option<PositionFix>,
    connect_attempts: u8,
    send_attempts: u8,
    last_transmit: Option<Instant>,
    last_speed: u16,
}

impl<G: FixSource, T: Transport> Reporter<G, T> {
    pub fn new(config: BeaconConfig, builder: FrameBuilder, gps: G, transport: T) -> Self {
        let status = DeviceStatus {
            firmware: config.firmware,
            ..DeviceStatus::default()
        };
        Reporter {
            config,
            builder,
            gps,
            transport,
            state: ReportingState::Startup,
            status,
            pending_fix: None,
            connect_attempts: 0,
            send_attempts: 0,
            last_transmit: None,
            last_speed: 0,
        }
    }

    /// Build the identity and cipher schedule from the configuration and wrap
    /// everything into a reporter. Fatal configuration or key-material errors
    /// surface here, before the loop starts.
    pub fn from_config(config: BeaconConfig, gps: G, transport: T) -> Result<Self, BeaconError> {
        let identity = config.identity()?;
        let builder = FrameBuilder::new(identity, &config.passphrase)?;
        Ok(Self::new(config, builder, gps, transport))
    }

    pub fn state(&self) -> ReportingState {
        self.state
    }

    pub fn pending_fix(&self) -> Option<&PositionFix> {
        self.pending_fix.as_ref()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Replace the status snapshot included in subsequent reports.
    pub fn set_status(&mut self, status: DeviceStatus) {
        self.status = status;
    }

    /// Run until powered off. Recoverable failures never escape the loop.
    pub async fn run(&mut self) {
        info!(
            serial = %self.builder.identity().serial,
            server = %self.config.server_host,
            port = self.config.server_port,
            "beacon starting"
        );
        loop {
            self.step().await;
        }
    }

    /// Execute the current state's work and apply one transition.
    pub async fn step(&mut self) {
        let event = match self.state {
            ReportingState::Startup => self.on_startup(),
            ReportingState::Init => self.on_init(),
            ReportingState::AcquireFix => self.acquire_fix().await,
            ReportingState::ConnectNetwork => self.connect().await,
            ReportingState::Ready => self.ready_wait().await,
            ReportingState::Transmit => self.transmit().await,
            ReportingState::Sleep => self.sleep_cycle().await,
            ReportingState::Error => self.backoff().await,
        };
        self.apply(event);
    }

    fn apply(&mut self, event: Event) {
        let limits = RetryLimits {
            connect_retries: self.config.connect_retries,
            send_retries: self.config.send_retries,
        };
        let step = transition(self.state, event, &limits);
        if step.next != self.state {
            info!(from = %self.state, to = %step.next, "state transition");
        }
        if step.action == Some(Action::ReportFailure) {
            error!(state = %self.state, ?event, "unrecoverable failure, entering backoff");
        }
        if step.next == ReportingState::Sleep {
            // The cycle is over either way; counters restart fresh.
            self.connect_attempts = 0;
            self.send_attempts = 0;
        }
        self.state = step.next;
    }

    fn on_startup(&mut self) -> Event {
        info!(
            source_type = %self.builder.identity().source_type,
            serial = %self.builder.identity().serial,
            "powering up"
        );
        Event::PowerOn
    }

    fn on_init(&mut self) -> Event {
        // Identity and cipher schedule were prepared when the builder was
        // constructed; this edge exists for lifecycle observability.
        debug!("identity loaded, cipher schedule ready");
        Event::InitDone
    }

    async fn acquire_fix(&mut self) -> Event {
        let deadline = self.config.gps_timeout();
        let gps = &mut self.gps;
        let outcome = timeout(deadline, async {
            loop {
                match gps.current_fix().await {
                    Ok(Some(fix)) if fix.valid => return Ok(fix),
                    Ok(_) => sleep(GPS_POLL_INTERVAL).await,
                    Err(e) => return Err(e),
                }
            }
        })
        .await;

        match outcome {
            Ok(Ok(fix)) => {
                info!(
                    lat = fix.lat,
                    lon = fix.lon,
                    satellites = fix.satellites,
                    hdop = fix.hdop,
                    "fix acquired"
                );
                self.last_speed = fix.speed;
                self.pending_fix = Some(fix);
                Event::FixAcquired
            }
            Ok(Err(e)) => {
                error!(error = %e, "fix source failed");
                Event::Fault
            }
            Err(_) => {
                warn!(error = %BeaconError::GpsTimeout(deadline), "giving up this cycle");
                Event::FixTimeout
            }
        }
    }

    async fn connect(&mut self) -> Event {
        if self.transport.is_connected() {
            self.connect_attempts = 0;
            return Event::NetworkUp;
        }
        let outcome = timeout(self.config.connect_timeout(), self.transport.connect()).await;
        match outcome {
            Ok(Ok(())) => {
                info!("network connected");
                self.connect_attempts = 0;
                Event::NetworkUp
            }
            Ok(Err(e)) => {
                self.connect_attempts = self.connect_attempts.saturating_add(1);
                warn!(error = %e, attempts = self.connect_attempts, "connect failed");
                Event::NetworkFailed {
                    attempts: self.connect_attempts,
                }
            }
            Err(_) => {
                self.connect_attempts = self.connect_attempts.saturating_add(1);
                warn!(
                    timeout = ?self.config.connect_timeout(),
                    attempts = self.connect_attempts,
                    "connect timed out"
                );
                Event::NetworkFailed {
                    attempts: self.connect_attempts,
                }
            }
        }
    }

    async fn ready_wait(&mut self) -> Event {
        // A pending retry transmits immediately with the preserved fix.
        if self.send_attempts > 0 && self.pending_fix.is_some() {
            return Event::IntervalElapsed;
        }
        if let Some(last) = self.last_transmit {
            let interval = self.report_interval();
            let elapsed = last.elapsed();
            if elapsed < interval {
                sleep(interval - elapsed).await;
            }
        }
        Event::IntervalElapsed
    }

    async fn transmit(&mut self) -> Event {
        let Some(fix) = self.pending_fix else {
            // Only reachable through driver misuse; recover through Error.
            error!("transmit entered without a fix");
            return Event::Fault;
        };

        let now = Utc::now().naive_utc();
        let frame = match self.builder.build(&fix, &self.status, now) {
            Ok(frame) => frame,
            Err(e @ BeaconError::Encoding { .. }) => {
                error!(error = %e, "frame rejected, skipping this report cycle");
                self.pending_fix = None;
                return Event::FrameRejected;
            }
            Err(e) => {
                error!(error = %e, "frame build failed");
                return Event::Fault;
            }
        };
        debug!(
            sequence = frame.sequence(),
            frame = %hex::encode(frame.as_bytes()),
            "frame sealed"
        );

        let outcome = timeout(self.config.send_timeout(), self.transport.send(frame.to_bytes())).await;
        match outcome {
            Ok(Ok(())) => {
                info!(sequence = frame.sequence(), "report transmitted");
                self.pending_fix = None;
                self.send_attempts = 0;
                self.last_transmit = Some(Instant::now());
                Event::SendSucceeded
            }
            Ok(Err(e)) => {
                self.send_attempts = self.send_attempts.saturating_add(1);
                warn!(error = %e, attempts = self.send_attempts, "send failed, fix retained");
                Event::SendFailed {
                    attempts: self.send_attempts,
                }
            }
            Err(_) => {
                self.send_attempts = self.send_attempts.saturating_add(1);
                warn!(
                    timeout = ?self.config.send_timeout(),
                    attempts = self.send_attempts,
                    "send timed out, fix retained"
                );
                Event::SendFailed {
                    attempts: self.send_attempts,
                }
            }
        }
    }

    async fn sleep_cycle(&mut self) -> Event {
        let interval = self.report_interval();
        debug!(interval = ?interval, "sleeping until next report");
        sleep(interval).await;
        Event::WakeUp
    }

    async fn backoff(&mut self) -> Event {
        let backoff = self.config.error_backoff();
        warn!(backoff = ?backoff, "error backoff");
        sleep(backoff).await;
        Event::BackoffElapsed
    }

    fn report_interval(&self) -> Duration {
        if self.config.adaptive_reporting {
            if self.last_speed > self.config.moving_speed_threshold {
                Duration::from_secs(self.config.moving_interval_secs)
            } else {
                Duration::from_secs(self.config.stationary_interval_secs)
            }
        } else {
            Duration::from_secs(self.config.report_interval_secs)
        }
    }
}
