//! The reporting lifecycle as an explicit enumerated state plus a pure
//! transition function, testable without hardware or network.
//!
//! The driver in [`crate::reporter`] executes the returned actions; nothing
//! here performs I/O. Retry counters live with the driver and arrive inside
//! the events, so the transition function stays a pure value mapping.

use strum_macros::Display;

/// Session lifecycle states. There is no terminal state; the machine runs
/// until the device is powered off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ReportingState {
    Startup,
    Init,
    AcquireFix,
    ConnectNetwork,
    Ready,
    Transmit,
    Sleep,
    Error,
}

/// Inputs observed by the driver loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    PowerOn,
    InitDone,
    FixAcquired,
    /// No valid fix within the bounded wait.
    FixTimeout,
    NetworkUp,
    /// Connect attempt failed; `attempts` counts consecutive failures.
    NetworkFailed { attempts: u8 },
    IntervalElapsed,
    SendSucceeded,
    /// Send attempt failed; `attempts` counts consecutive failures.
    SendFailed { attempts: u8 },
    /// A frame field was unrepresentable; the cycle is skipped.
    FrameRejected,
    WakeUp,
    BackoffElapsed,
    /// Unrecoverable failure in the current state.
    Fault,
}

/// Side effects the driver performs on entry to the next state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    PollGps,
    Connect,
    BuildAndSend,
    Wait,
    Backoff,
    ReportFailure,
}

/// Retry bounds consulted by the transition function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryLimits {
    pub connect_retries: u8,
    pub send_retries: u8,
}

/// One transition result: the next state and the action to run on entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub next: ReportingState,
    pub action: Option<Action>,
}

fn step(next: ReportingState, action: Action) -> Step {
    Step {
        next,
        action: Some(action),
    }
}

/// Pure transition function `(state, event) -> (state, action)`.
///
/// Events that make no sense in the current state leave it unchanged with no
/// action; the driver never emits them, but a stale event must not derail the
/// session.
pub fn transition(state: ReportingState, event: Event, limits: &RetryLimits) -> Step {
    use Event::*;
    use ReportingState::*;

    match (state, event) {
        (_, Fault) => step(Error, Action::ReportFailure),

        (Startup, PowerOn) => step(Init, Action::Wait),
        (Init, InitDone) => step(AcquireFix, Action::PollGps),

        (AcquireFix, FixAcquired) => step(ConnectNetwork, Action::Connect),
        // Recoverable: sleep through the interval, then try again.
        (AcquireFix, FixTimeout) => step(Sleep, Action::Wait),

        (ConnectNetwork, NetworkUp) => step(Ready, Action::Wait),
        (ConnectNetwork, NetworkFailed { attempts }) => {
            if attempts < limits.connect_retries {
                step(ConnectNetwork, Action::Connect)
            } else {
                step(Error, Action::ReportFailure)
            }
        }

        (Ready, IntervalElapsed) => step(Transmit, Action::BuildAndSend),

        (Transmit, SendSucceeded) => step(Sleep, Action::Wait),
        // The fix is not discarded: reconnect and retry with the same data,
        // refreshing only sequence and timestamps. After the bounded retry
        // count, give up the cycle and conserve power.
        (Transmit, SendFailed { attempts }) => {
            if attempts < limits.send_retries {
                step(ConnectNetwork, Action::Connect)
            } else {
                step(Sleep, Action::Wait)
            }
        }
        (Transmit, FrameRejected) => step(Sleep, Action::Wait),

        (Sleep, WakeUp) => step(AcquireFix, Action::PollGps),
        (Error, BackoffElapsed) => step(AcquireFix, Action::PollGps),

        // Stale or mismatched event: hold the state.
        (state, _) => Step {
            next: state,
            action: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIMITS: RetryLimits = RetryLimits {
        connect_retries: 3,
        send_retries: 3,
    };

    #[test]
    fn happy_path_cycle() {
        use ReportingState::*;
        let edges = [
            (Startup, Event::PowerOn, Init),
            (Init, Event::InitDone, AcquireFix),
            (AcquireFix, Event::FixAcquired, ConnectNetwork),
            (ConnectNetwork, Event::NetworkUp, Ready),
            (Ready, Event::IntervalElapsed, Transmit),
            (Transmit, Event::SendSucceeded, Sleep),
            (Sleep, Event::WakeUp, AcquireFix),
        ];
        for (from, event, to) in edges {
            assert_eq!(transition(from, event, &LIMITS).next, to, "{from} -> {to}");
        }
    }

    #[test]
    fn failed_send_reconnects_not_reacquires() {
        let step = transition(
            ReportingState::Transmit,
            Event::SendFailed { attempts: 1 },
            &LIMITS,
        );
        assert_eq!(step.next, ReportingState::ConnectNetwork);
        assert_eq!(step.action, Some(Action::Connect));
    }

    #[test]
    fn exhausted_sends_fall_back_to_sleep() {
        let step = transition(
            ReportingState::Transmit,
            Event::SendFailed { attempts: 3 },
            &LIMITS,
        );
        assert_eq!(step.next, ReportingState::Sleep);
    }

    #[test]
    fn gps_timeout_sleeps_and_retries() {
        let step = transition(ReportingState::AcquireFix, Event::FixTimeout, &LIMITS);
        assert_eq!(step.next, ReportingState::Sleep);
        assert_eq!(
            transition(ReportingState::Sleep, Event::WakeUp, &LIMITS).next,
            ReportingState::AcquireFix
        );
    }

    #[test]
    fn connect_retries_then_error_then_backoff_to_acquire() {
        let retry = transition(
            ReportingState::ConnectNetwork,
            Event::NetworkFailed { attempts: 2 },
            &LIMITS,
        );
        assert_eq!(retry.next, ReportingState::ConnectNetwork);

        let gave_up = transition(
            ReportingState::ConnectNetwork,
            Event::NetworkFailed { attempts: 3 },
            &LIMITS,
        );
        assert_eq!(gave_up.next, ReportingState::Error);
        assert_eq!(gave_up.action, Some(Action::ReportFailure));

        let recovered = transition(ReportingState::Error, Event::BackoffElapsed, &LIMITS);
        assert_eq!(recovered.next, ReportingState::AcquireFix);
        assert_eq!(recovered.action, Some(Action::PollGps));
    }

    #[test]
    fn fault_routes_to_error_from_any_state() {
        for state in [
            ReportingState::Startup,
            ReportingState::AcquireFix,
            ReportingState::ConnectNetwork,
            ReportingState::Transmit,
            ReportingState::Sleep,
        ] {
            assert_eq!(
                transition(state, Event::Fault, &LIMITS).next,
                ReportingState::Error
            );
        }
    }

    #[test]
    fn rejected_frame_skips_the_cycle() {
        let step = transition(ReportingState::Transmit, Event::FrameRejected, &LIMITS);
        assert_eq!(step.next, ReportingState::Sleep);
    }

    #[test]
    fn stale_events_hold_state() {
        let step = transition(ReportingState::Ready, Event::WakeUp, &LIMITS);
        assert_eq!(step.next, ReportingState::Ready);
        assert_eq!(step.action, None);
    }
}
