//! Delivery of session output to consumers.
//!
//! Consumers subscribe once with a [`SessionObserver`]. Any
//! `mpsc::Sender<SessionEvent>` is also an observer, for consumers that
//! prefer to drain a channel on their own thread.

use std::sync::mpsc::Sender;

use log::debug;

use crate::authorization::AuthorizationState;
use crate::provider::ReceiverError;
use crate::track::Track;
use crate::validator::FixRejection;
use crate::TrackPoint;

/// Non-fatal conditions raised during a session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionCondition {
    /// A fix failed validation and was dropped
    InaccurateFix(FixRejection),
    /// Authorization dropped below what the session started with.
    /// Tracking continues, possibly foreground-only.
    AuthorizationDegraded {
        from: AuthorizationState,
        to: AuthorizationState,
    },
    /// Authorization is gone; no more fixes will arrive
    AuthorizationLost(AuthorizationState),
    /// Transient receiver failure
    Receiver(ReceiverError),
}

/// Everything an observer can receive, as a single message type.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    TrackPoint(TrackPoint),
    Condition(SessionCondition),
    AuthorizationChanged(AuthorizationState),
    /// The session stopped on its own (authorization loss) with this track
    Finished(Track),
}

/// Receiver of session output. Every method defaults to doing nothing.
pub trait SessionObserver: Send {
    fn on_track_point(&mut self, _point: &TrackPoint) {}

    fn on_condition(&mut self, _condition: &SessionCondition) {}

    fn on_authorization_changed(&mut self, _state: AuthorizationState) {}

    /// Called when the controller ends a session itself. A session ended by
    /// `stop()` returns its track to the caller instead.
    fn on_session_finished(&mut self, _track: &Track) {}
}

impl SessionObserver for Sender<SessionEvent> {
    fn on_track_point(&mut self, point: &TrackPoint) {
        forward(self, SessionEvent::TrackPoint(*point));
    }

    fn on_condition(&mut self, condition: &SessionCondition) {
        forward(self, SessionEvent::Condition(condition.clone()));
    }

    fn on_authorization_changed(&mut self, state: AuthorizationState) {
        forward(self, SessionEvent::AuthorizationChanged(state));
    }

    fn on_session_finished(&mut self, track: &Track) {
        forward(self, SessionEvent::Finished(track.clone()));
    }
}

fn forward(sender: &Sender<SessionEvent>, event: SessionEvent) {
    if sender.send(event).is_err() {
        debug!("[HikeSession] Event receiver dropped, discarding event");
    }
}
