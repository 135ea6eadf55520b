//! Cloud fallback playback
//!
//! Used when no local voice exists for a language. The whole text is
//! rendered remotely and played back as a single unit, so there is no
//! sentence-level progress or resume at this tier.

use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;

use crate::error::{EngineError, Result};
use crate::language::Language;
use crate::sequencer::{PlaybackOutcome, until_stopped};
use crate::translate::Translator;

/// Renders text into an encoded audio resource (e.g., MP3 bytes)
#[async_trait]
pub trait SpeechRenderer: Send + Sync {
    async fn render(&self, text: &str, language: Language) -> Result<Vec<u8>>;
}

/// Somewhere rendered audio can be played
pub trait AudioSink: Send + Sync {
    /// Begin playing `audio`. The returned playback owns the resource.
    fn start(&self, audio: Vec<u8>) -> Result<Box<dyn AudioPlayback>>;
}

/// A started audio playback
#[async_trait]
pub trait AudioPlayback: Send + Sync {
    /// Resolves when playback ends, naturally or because it was stopped
    async fn wait(&self) -> Result<()>;

    /// Stop playing and free the resource. Idempotent.
    fn stop(&self);
}

/// Exclusive owner of the currently playing remote audio
struct CloudAudioHandle {
    id: u64,
    playback: Arc<dyn AudioPlayback>,
}

#[derive(Default)]
struct HandleSlot {
    next_id: u64,
    /// Bumped by every `play_remote` call
    generation: u64,
    /// Present while a call is translating, rendering or playing
    stop: Option<watch::Sender<bool>>,
    current: Option<CloudAudioHandle>,
}

/// Plays whole-text remote renders, one at a time
pub struct CloudFallbackPlayer {
    renderer: Arc<dyn SpeechRenderer>,
    sink: Arc<dyn AudioSink>,
    translator: Option<Arc<Translator>>,
    slot: Mutex<HandleSlot>,
}

impl CloudFallbackPlayer {
    pub fn new(renderer: Arc<dyn SpeechRenderer>, sink: Arc<dyn AudioSink>) -> Self {
        Self {
            renderer,
            sink,
            translator: None,
            slot: Mutex::new(HandleSlot::default()),
        }
    }

    /// Translator used when text arrives in the wrong script
    pub fn with_translator(mut self, translator: Arc<Translator>) -> Self {
        self.translator = Some(translator);
        self
    }

    pub fn is_playing(&self) -> bool {
        self.slot().current.is_some()
    }

    /// Render `text` remotely and play it to the end.
    ///
    /// Text not written in the language's script is translated first; if
    /// it still is not, nothing is played. A call that is stopped (or
    /// superseded by a newer call) before its audio starts never starts it.
    pub async fn play_remote(&self, text: &str, language: Language) -> Result<PlaybackOutcome> {
        let text = text.trim();
        if text.is_empty() {
            return Err(EngineError::RemoteRender {
                message: "Empty text".to_string(),
                status_code: None,
            });
        }

        let (generation, mut stop_rx) = self.begin_call();
        let result = self.render_and_play(text, language, generation, &mut stop_rx).await;
        self.end_call(generation);
        result
    }

    /// Stop the current remote call, pending or playing, if any
    pub fn stop(&self) {
        let (pending, previous) = {
            let mut slot = self.slot();
            (slot.stop.take(), slot.current.take())
        };

        if let Some(stop) = pending {
            let _ = stop.send(true);
        }
        if let Some(handle) = previous {
            log::debug!("Stopping cloud audio {}", handle.id);
            handle.playback.stop();
        }
    }

    fn slot(&self) -> MutexGuard<'_, HandleSlot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn begin_call(&self) -> (u64, watch::Receiver<bool>) {
        let (stop_tx, stop_rx) = watch::channel(false);
        let mut slot = self.slot();
        if let Some(previous) = slot.stop.replace(stop_tx) {
            let _ = previous.send(true);
        }
        slot.generation += 1;
        (slot.generation, stop_rx)
    }

    fn end_call(&self, generation: u64) {
        let mut slot = self.slot();
        if slot.generation == generation {
            slot.stop = None;
        }
    }

    async fn render_and_play(
        &self,
        text: &str,
        language: Language,
        generation: u64,
        stop_rx: &mut watch::Receiver<bool>,
    ) -> Result<PlaybackOutcome> {
        let stopped = PlaybackOutcome::Stopped { resume_at: 0 };

        let text = match until_stopped(stop_rx, self.ensure_script(text, language)).await {
            Some(text) => text?,
            None => return Ok(stopped),
        };

        log::info!(
            "Rendering {} characters of {} speech remotely",
            text.chars().count(),
            language
        );
        let audio = match until_stopped(stop_rx, self.renderer.render(&text, language)).await {
            Some(audio) => audio?,
            None => return Ok(stopped),
        };
        if audio.is_empty() {
            return Err(EngineError::RemoteRender {
                message: "Render service returned no audio".to_string(),
                status_code: None,
            });
        }

        let Some((id, playback)) = self.acquire(generation, audio)? else {
            log::debug!("Cloud call {} stopped before its audio started", generation);
            return Ok(stopped);
        };
        let result = playback.wait().await;

        if self.release_if_current(id) {
            result.map(|_| PlaybackOutcome::Completed)
        } else {
            // Stopped or replaced while playing; its end no longer counts
            Ok(stopped)
        }
    }

    async fn ensure_script(&self, text: &str, language: Language) -> Result<String> {
        if language.matches_script(text) {
            return Ok(text.to_string());
        }

        let Some(translator) = &self.translator else {
            return Err(EngineError::ScriptMismatch { language });
        };

        log::info!("Text is not in {} script, translating before render", language);
        let translated = translator.translate(text, language).await;
        if language.matches_script(&translated) {
            Ok(translated)
        } else {
            Err(EngineError::ScriptMismatch { language })
        }
    }

    /// Release any prior handle, then start the new audio.
    ///
    /// Returns `None` without starting anything when the call was stopped
    /// or superseded while it was rendering.
    fn acquire(
        &self,
        generation: u64,
        audio: Vec<u8>,
    ) -> Result<Option<(u64, Arc<dyn AudioPlayback>)>> {
        let mut slot = self.slot();
        if slot.generation != generation || slot.stop.is_none() {
            return Ok(None);
        }

        if let Some(previous) = slot.current.take() {
            log::debug!("Releasing cloud audio {} before starting another", previous.id);
            previous.playback.stop();
        }

        let playback: Arc<dyn AudioPlayback> = Arc::from(self.sink.start(audio)?);
        slot.next_id += 1;
        let id = slot.next_id;
        slot.current = Some(CloudAudioHandle {
            id,
            playback: Arc::clone(&playback),
        });

        Ok(Some((id, playback)))
    }

    fn release_if_current(&self, id: u64) -> bool {
        let mut slot = self.slot();
        match &slot.current {
            Some(handle) if handle.id == id => {
                slot.current = None;
                true
            }
            _ => false,
        }
    }
}
