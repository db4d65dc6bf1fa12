//! # Session Controller
//!
//! Stateful controller for one hiking session at a time.
//!
//! ## Architecture
//!
//! The controller owns:
//! - The location provider (receiver on/off, permission queries)
//! - The in-flight track and its smoothing state
//! - The subscribed observers
//!
//! Every inbound fix goes through validator → smoother → track accumulator.
//! Accepted points are appended and forwarded to observers; rejected fixes
//! are reported as a non-fatal condition.
//!
//! The controller is not a singleton: construct one per session owner. It
//! takes `&mut self` everywhere and expects a single delivery context; wrap
//! it in [`SharedSession`](crate::SharedSession) to drive it from several
//! threads.

use chrono::{DateTime, Utc};
use log::{debug, info, warn};

use crate::authorization::{AuthorizationState, ProviderAuthorization};
use crate::clock::{Clock, SystemClock};
use crate::config::TrackerConfig;
use crate::error::{OptionExt, Result, TrackerError};
use crate::events::{SessionCondition, SessionObserver};
use crate::provider::{AuthorizationScope, LocationProvider, ReceiverError};
use crate::smoothing::AltitudeSmoother;
use crate::track::{Track, TrackStatistics};
use crate::validator::{FixRejection, FixValidator};
use crate::{PositionFix, TrackPoint};

// ============================================================================
// Core Types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No track
    Idle,
    /// Tracking and accepting fixes
    Active,
    /// Track retained, fixes ignored
    Paused,
}

/// What happened to one inbound fix.
#[derive(Debug, Clone, PartialEq)]
pub enum FixOutcome {
    /// Appended to the track as this point
    Accepted(TrackPoint),
    /// Failed validation
    Rejected(FixRejection),
    /// Arrived while idle or paused
    Dropped,
}

/// Per-session state, present only while a session exists.
struct ActiveSession {
    config: TrackerConfig,
    track: Track,
    validator: FixValidator,
    smoother: AltitudeSmoother,
    last_accepted_fix: Option<PositionFix>,
    last_accepted_time: Option<DateTime<Utc>>,
    paused: bool,
}

impl ActiveSession {
    fn new(config: TrackerConfig, start_time: DateTime<Utc>) -> Self {
        Self {
            track: Track::new(start_time, config.distance_formula),
            validator: FixValidator::new(config.validation.clone(), config.distance_formula),
            smoother: AltitudeSmoother::new(config.smoothing),
            last_accepted_fix: None,
            last_accepted_time: None,
            paused: false,
            config,
        }
    }

    fn process(&mut self, fix: PositionFix, now: DateTime<Utc>) -> FixOutcome {
        if let Err(reason) = self.validator.check(
            &fix,
            self.last_accepted_fix.as_ref(),
            self.last_accepted_time,
            now,
        ) {
            return FixOutcome::Rejected(reason);
        }

        let smoothed = self.smoother.smooth(fix.altitude);
        let point = TrackPoint::from_fix(&fix, smoothed);
        if let Err(err) = self.track.append(point) {
            warn!("[HikeSession] Could not append point: {}", err);
            return FixOutcome::Dropped;
        }

        self.last_accepted_fix = Some(fix);
        self.last_accepted_time = Some(now);
        FixOutcome::Accepted(point)
    }
}

// ============================================================================
// Session Controller
// ============================================================================

/// Start/pause/resume/stop state machine around one track.
pub struct SessionController<P: LocationProvider> {
    provider: P,
    clock: Box<dyn Clock>,
    session: Option<ActiveSession>,
    authorization: AuthorizationState,
    observers: Vec<Box<dyn SessionObserver>>,
}

impl<P: LocationProvider> SessionController<P> {
    /// Create a controller that reads time from the system clock.
    pub fn new(provider: P) -> Self {
        Self::with_clock(provider, Box::new(SystemClock))
    }

    /// Create a controller with a custom time source.
    pub fn with_clock(provider: P, clock: Box<dyn Clock>) -> Self {
        let authorization = AuthorizationState::from(provider.current_authorization());
        Self {
            provider,
            clock,
            session: None,
            authorization,
            observers: Vec::new(),
        }
    }

    /// Register an observer for points, conditions and authorization changes.
    pub fn subscribe<O: SessionObserver + 'static>(&mut self, observer: O) {
        self.observers.push(Box::new(observer));
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn state(&self) -> SessionState {
        match &self.session {
            None => SessionState::Idle,
            Some(session) if session.paused => SessionState::Paused,
            Some(_) => SessionState::Active,
        }
    }

    /// Last authorization state seen from the provider.
    pub fn authorization_state(&self) -> AuthorizationState {
        self.authorization
    }

    /// Running totals while a session is active or paused.
    pub fn current_statistics(&self) -> Option<TrackStatistics> {
        self.session.as_ref().map(|s| s.track.statistics())
    }

    /// The in-flight track, read-only.
    pub fn current_track(&self) -> Option<&Track> {
        self.session.as_ref().map(|s| &s.track)
    }

    /// Configuration of the current session.
    pub fn config(&self) -> Option<&TrackerConfig> {
        self.session.as_ref().map(|s| &s.config)
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn provider_mut(&mut self) -> &mut P {
        &mut self.provider
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Ask for permission at `scope`.
    ///
    /// When the provider's state is already settled for `scope` (granted,
    /// or denied in settings) no prompt is shown: observers get
    /// `on_authorization_changed` right away and the state is returned.
    /// Otherwise the provider prompts, this returns `None`, and the answer
    /// arrives through
    /// [`handle_authorization_change`](Self::handle_authorization_change).
    pub fn request_authorization(
        &mut self,
        scope: AuthorizationScope,
    ) -> Option<AuthorizationState> {
        let state = AuthorizationState::from(self.provider.current_authorization());
        if state.requires_prompt(scope) {
            info!("[HikeSession] Requesting {:?} authorization", scope);
            self.provider.request_authorization(scope);
            return None;
        }

        debug!("[HikeSession] {:?} request already settled: {}", scope, state);
        self.authorization = state;
        for observer in &mut self.observers {
            observer.on_authorization_changed(state);
        }
        Some(state)
    }

    /// Start a new session.
    ///
    /// Calling this while a session exists (active or paused) does nothing.
    pub fn start(&mut self, config: TrackerConfig) -> Result<()> {
        if self.session.is_some() {
            debug!("[HikeSession] start ignored, session already {:?}", self.state());
            return Ok(());
        }

        config.validate()?;

        if !self.provider.location_services_enabled() {
            warn!("[HikeSession] Location services disabled, not starting");
            return Err(TrackerError::LocationServicesDisabled);
        }

        let state = AuthorizationState::from(self.provider.current_authorization());
        self.authorization = state;
        if !config.is_authorized(state) {
            warn!(
                "[HikeSession] Authorization '{}' insufficient (foreground only: {})",
                state, config.allow_foreground_only
            );
            return Err(TrackerError::AuthorizationDenied { state });
        }

        let session = ActiveSession::new(config, self.clock.now());
        self.provider.start_receiving_fixes(&session.config.receiver);
        info!(
            "[HikeSession] Started at {} ({:?})",
            session.track.start_time(),
            session.config.smoothing
        );
        self.session = Some(session);
        Ok(())
    }

    /// Suspend fix consumption. The track is kept unchanged.
    pub fn pause(&mut self) {
        let state = self.state();
        match self.session.as_mut() {
            Some(session) if !session.paused => {
                session.paused = true;
                self.provider.stop_receiving_fixes();
                info!("[HikeSession] Paused with {} points", session.track.len());
            }
            _ => debug!("[HikeSession] pause ignored in state {:?}", state),
        }
    }

    /// Resume fix consumption into the same track.
    pub fn resume(&mut self) {
        let state = self.state();
        match self.session.as_mut() {
            Some(session) if session.paused => {
                session.paused = false;
                self.provider.start_receiving_fixes(&session.config.receiver);
                info!("[HikeSession] Resumed");
            }
            _ => debug!("[HikeSession] resume ignored in state {:?}", state),
        }
    }

    /// Stop the session and hand over the finalized track.
    ///
    /// Returns [`TrackerError::NoActiveSession`] when idle.
    pub fn stop(&mut self) -> Result<Track> {
        let mut session = self.session.take().ok_or_no_session()?;
        if !session.paused {
            self.provider.stop_receiving_fixes();
        }

        session.track.finalize(self.clock.now());
        let stats = session.track.statistics();
        info!(
            "[HikeSession] Stopped: {} points, {:.0} m, +{:.0}/-{:.0} m",
            stats.point_count, stats.distance, stats.ascent, stats.descent
        );
        Ok(session.track)
    }

    // ========================================================================
    // Provider Input
    // ========================================================================

    /// Process one fix from the provider.
    pub fn handle_fix(&mut self, fix: PositionFix) -> FixOutcome {
        let now = self.clock.now();
        let outcome = match self.session.as_mut() {
            Some(session) if !session.paused => session.process(fix, now),
            Some(_) => {
                debug!("[HikeSession] Fix dropped while paused");
                FixOutcome::Dropped
            }
            None => {
                debug!("[HikeSession] Fix dropped, no session");
                FixOutcome::Dropped
            }
        };

        match &outcome {
            FixOutcome::Accepted(point) => {
                for observer in &mut self.observers {
                    observer.on_track_point(point);
                }
            }
            FixOutcome::Rejected(reason) => {
                debug!("[HikeSession] Fix rejected: {:?}", reason);
                self.notify_condition(SessionCondition::InaccurateFix(*reason));
            }
            FixOutcome::Dropped => {}
        }
        outcome
    }

    /// Process a batch of fixes in delivery order.
    pub fn handle_fixes<I>(&mut self, fixes: I) -> Vec<FixOutcome>
    where
        I: IntoIterator<Item = PositionFix>,
    {
        fixes.into_iter().map(|fix| self.handle_fix(fix)).collect()
    }

    /// Process a permission change from the provider.
    ///
    /// Dropping from "always" to "when in use" is reported as a degradation
    /// for every session, foreground-only ones included, and tracking
    /// continues. Losing authorization entirely stops the session when the
    /// config says so; the finished track goes to `on_session_finished`.
    pub fn handle_authorization_change(
        &mut self,
        native: ProviderAuthorization,
    ) -> AuthorizationState {
        let state = AuthorizationState::from(native);
        let previous = std::mem::replace(&mut self.authorization, state);
        if previous != state {
            info!("[HikeSession] Authorization {} -> {}", previous, state);
        }

        for observer in &mut self.observers {
            observer.on_authorization_changed(state);
        }

        let stop_on_loss = match &self.session {
            Some(session) => session.config.stop_on_authorization_loss,
            None => return state,
        };

        if state.is_loss() {
            self.handle_authorization_loss(state, stop_on_loss);
        } else if previous == AuthorizationState::Always
            && state == AuthorizationState::WhenInUse
        {
            warn!("[HikeSession] Background authorization withdrawn, tracking continues");
            self.notify_condition(SessionCondition::AuthorizationDegraded {
                from: previous,
                to: state,
            });
        }
        state
    }

    /// Process a receiver failure. Only a denial affects the session.
    pub fn handle_receiver_error(&mut self, error: ReceiverError) {
        let stop_on_loss = match &self.session {
            Some(session) => session.config.stop_on_authorization_loss,
            None => {
                debug!("[HikeSession] Receiver error with no session: {:?}", error);
                return;
            }
        };

        if error.is_transient() {
            warn!("[HikeSession] Receiver error, continuing: {:?}", error);
            self.notify_condition(SessionCondition::Receiver(error));
        } else {
            self.authorization = AuthorizationState::Denied;
            self.handle_authorization_loss(AuthorizationState::Denied, stop_on_loss);
        }
    }

    fn handle_authorization_loss(&mut self, state: AuthorizationState, stop_on_loss: bool) {
        warn!("[HikeSession] Authorization lost ({})", state);
        self.notify_condition(SessionCondition::AuthorizationLost(state));

        if !stop_on_loss {
            return;
        }
        if let Ok(track) = self.stop() {
            for observer in &mut self.observers {
                observer.on_session_finished(&track);
            }
        }
    }

    fn notify_condition(&mut self, condition: SessionCondition) {
        for observer in &mut self.observers {
            observer.on_condition(&condition);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
