//! Sentence-by-sentence playback state machine
//!
//! A [`PlaybackController`] owns at most one live session. Every suspension
//! point of a session (catalog wait, each utterance) is raced against the
//! session's stop signal, so once `stop()` returns the old session can no
//! longer advance its cursor or reach the platform again.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;

use crate::error::{EngineError, Result};
use crate::language::Language;
use crate::platform::{SpeakRequest, SpeechPlatform};
use crate::segment::utterances;
use crate::voice::{DEFAULT_CATALOG_WAIT, resolve_strict, wait_for_catalog};

/// Observable state of the controller's current (or last) session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackStatus {
    Idle,
    Speaking,
    Paused,
    Ended,
    Failed,
}

/// How a call to `play` finished without error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackOutcome {
    /// Every unit was spoken and `on_end` fired
    Completed,
    /// The session was stopped or paused; `resume_at` is the next unit to speak
    Stopped { resume_at: usize },
}

struct SessionState {
    generation: u64,
    status: PlaybackStatus,
    resume_at: usize,
    /// Present only while a session is live
    stop: Option<watch::Sender<bool>>,
}

/// Drives a speech platform through an ordered queue of utterances
pub struct PlaybackController {
    platform: Arc<dyn SpeechPlatform>,
    catalog_wait: Duration,
    state: Mutex<SessionState>,
}

impl std::fmt::Debug for PlaybackController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state();
        f.debug_struct("PlaybackController")
            .field("platform", &self.platform.name())
            .field("status", &state.status)
            .field("resume_at", &state.resume_at)
            .finish()
    }
}

impl PlaybackController {
    pub fn new(platform: Arc<dyn SpeechPlatform>) -> Self {
        Self {
            platform,
            catalog_wait: DEFAULT_CATALOG_WAIT,
            state: Mutex::new(SessionState {
                generation: 0,
                status: PlaybackStatus::Idle,
                resume_at: 0,
                stop: None,
            }),
        }
    }

    /// Bound on how long to wait for an empty voice catalog
    pub fn with_catalog_wait(mut self, wait: Duration) -> Self {
        self.catalog_wait = wait;
        self
    }

    pub fn platform(&self) -> &Arc<dyn SpeechPlatform> {
        &self.platform
    }

    pub fn catalog_wait(&self) -> Duration {
        self.catalog_wait
    }

    pub fn status(&self) -> PlaybackStatus {
        self.state().status
    }

    /// Index of the next unit a resumed session should start from
    pub fn resume_index(&self) -> usize {
        self.state().resume_at
    }

    pub fn is_active(&self) -> bool {
        self.state().stop.is_some()
    }

    /// Speak `text` one sentence at a time, starting at `start_index`.
    ///
    /// `on_progress(i + 1)` fires after unit `i` finishes speaking, in
    /// strictly increasing order; `on_end` fires once after the last unit.
    /// Any session already running on this controller is stopped first.
    pub async fn play<P, E>(
        &self,
        text: &str,
        start_index: usize,
        language: Language,
        mut on_progress: P,
        on_end: E,
    ) -> Result<PlaybackOutcome>
    where
        P: FnMut(usize) + Send,
        E: FnOnce() + Send,
    {
        let (generation, mut stop_rx) = self.begin_session(start_index);
        let mut resume_at = start_index;

        let voices = match until_stopped(
            &mut stop_rx,
            wait_for_catalog(self.platform.as_ref(), self.catalog_wait),
        )
        .await
        {
            Some(voices) => voices,
            None => return Ok(PlaybackOutcome::Stopped { resume_at }),
        };

        let queue = utterances(text);
        log::debug!(
            "Session {}: {} units, starting at {}",
            generation,
            queue.len(),
            start_index
        );

        // One voice per session, chosen for the first unit that will be spoken
        let first_speakable = queue.iter().skip(start_index).find(|u| !u.is_blank());
        let voice = match first_speakable {
            Some(unit) => match resolve_strict(language, &voices) {
                Some(voice) => {
                    log::info!("Using voice {} ({})", voice.name, voice.locale);
                    Some(voice.clone())
                }
                None => {
                    self.finish(generation, PlaybackStatus::Failed);
                    return Err(EngineError::VoiceUnavailable {
                        language,
                        index: unit.index,
                    });
                }
            },
            None => None,
        };

        for unit in queue.iter().skip(start_index) {
            if unit.is_blank() {
                continue;
            }
            let Some(voice) = voice.clone() else {
                break;
            };

            let request = SpeakRequest {
                text: unit.speakable().to_string(),
                locale: language.bcp47().to_string(),
                voice,
            };

            match until_stopped(&mut stop_rx, self.platform.speak(&request)).await {
                None => return Ok(PlaybackOutcome::Stopped { resume_at }),
                Some(Err(source)) => {
                    self.finish(generation, PlaybackStatus::Failed);
                    return Err(EngineError::Synthesis {
                        index: unit.index,
                        source,
                    });
                }
                Some(Ok(())) => {
                    if !self.record_progress(generation, unit.index + 1) {
                        return Ok(PlaybackOutcome::Stopped { resume_at });
                    }
                    resume_at = unit.index + 1;
                    on_progress(resume_at);
                }
            }
        }

        if self.finish(generation, PlaybackStatus::Ended) {
            on_end();
            Ok(PlaybackOutcome::Completed)
        } else {
            Ok(PlaybackOutcome::Stopped { resume_at })
        }
    }

    /// Stop the active session. A no-op when nothing is playing.
    pub fn stop(&self) {
        self.halt(PlaybackStatus::Idle);
    }

    /// Stop the active session and return the index to resume from
    pub fn pause(&self) -> usize {
        self.halt(PlaybackStatus::Paused)
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn begin_session(&self, start_index: usize) -> (u64, watch::Receiver<bool>) {
        let (stop_tx, stop_rx) = watch::channel(false);

        let generation = {
            let mut state = self.state();
            if let Some(previous) = state.stop.take() {
                log::debug!("Stopping session {} before starting a new one", state.generation);
                let _ = previous.send(true);
            }
            state.generation += 1;
            state.status = PlaybackStatus::Speaking;
            state.resume_at = start_index;
            state.stop = Some(stop_tx);
            state.generation
        };

        // Unconditional: nothing from an earlier session may still be audible
        self.platform.cancel();

        (generation, stop_rx)
    }

    fn halt(&self, status: PlaybackStatus) -> usize {
        let (was_active, resume_at) = {
            let mut state = self.state();
            match state.stop.take() {
                Some(stop_tx) => {
                    let _ = stop_tx.send(true);
                    state.status = status;
                    (true, state.resume_at)
                }
                None => (false, state.resume_at),
            }
        };

        // The session's stop signal fired first, so cancelling cannot advance it
        if was_active {
            self.platform.cancel();
            log::debug!("Playback halted at unit {}", resume_at);
        }
        resume_at
    }

    fn record_progress(&self, generation: u64, next: usize) -> bool {
        let mut state = self.state();
        if state.generation != generation || state.stop.is_none() {
            return false;
        }
        state.resume_at = next;
        true
    }

    fn finish(&self, generation: u64, status: PlaybackStatus) -> bool {
        let mut state = self.state();
        if state.generation != generation || state.stop.is_none() {
            return false;
        }
        state.stop = None;
        state.status = status;
        if status == PlaybackStatus::Ended {
            state.resume_at = 0;
        }
        true
    }
}

/// Run `fut` unless the stop signal fires first
pub(crate) async fn until_stopped<F: Future>(
    stop: &mut watch::Receiver<bool>,
    fut: F,
) -> Option<F::Output> {
    tokio::select! {
        biased;
        _ = async {
            let _ = stop.wait_for(|stopped| *stopped).await;
        } => None,
        out = fut => Some(out),
    }
}
