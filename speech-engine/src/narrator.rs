//! Routing between local sentence playback and the cloud fallback

use crate::cloud::CloudFallbackPlayer;
use crate::error::Result;
use crate::language::Language;
use crate::sequencer::{PlaybackController, PlaybackOutcome};
use crate::voice::{has_voice_for, wait_for_catalog};

/// Which tier served (or would serve) a narration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Local voice, sentence by sentence
    Local,
    /// Remote render, whole text at once
    Cloud,
}

/// Plays text through a local voice when one exists, remotely otherwise
pub struct Narrator {
    controller: PlaybackController,
    cloud: CloudFallbackPlayer,
}

impl Narrator {
    pub fn new(controller: PlaybackController, cloud: CloudFallbackPlayer) -> Self {
        Self { controller, cloud }
    }

    pub fn controller(&self) -> &PlaybackController {
        &self.controller
    }

    /// Capability probe against the (possibly still loading) voice catalog
    pub async fn route_for(&self, language: Language) -> Route {
        let voices = wait_for_catalog(
            self.controller.platform().as_ref(),
            self.controller.catalog_wait(),
        )
        .await;

        if has_voice_for(language, &voices) {
            Route::Local
        } else {
            Route::Cloud
        }
    }

    /// Narrate `text`, resuming local playback at `start_index`.
    ///
    /// `on_progress` only fires on the local route. A local session that
    /// loses its voice is retried once through the cloud.
    pub async fn narrate<P>(
        &self,
        text: &str,
        language: Language,
        start_index: usize,
        on_progress: P,
    ) -> Result<(Route, PlaybackOutcome)>
    where
        P: FnMut(usize) + Send,
    {
        match self.route_for(language).await {
            Route::Local => {
                self.cloud.stop();
                let local = self
                    .controller
                    .play(text, start_index, language, on_progress, || {
                        log::debug!("Local narration finished")
                    })
                    .await;

                match local {
                    Err(e) if e.is_voice_unavailable() => {
                        log::warn!("{}, switching to cloud speech", e);
                        self.play_cloud(text, language).await
                    }
                    other => other.map(|outcome| (Route::Local, outcome)),
                }
            }
            Route::Cloud => {
                log::info!("No local {} voice installed, using cloud speech", language);
                self.play_cloud(text, language).await
            }
        }
    }

    /// Stop whichever tier is playing
    pub fn stop(&self) {
        self.cloud.stop();
        self.controller.stop();
    }

    /// Stop playback and return the local resume index
    pub fn pause(&self) -> usize {
        self.cloud.stop();
        self.controller.pause()
    }

    async fn play_cloud(&self, text: &str, language: Language) -> Result<(Route, PlaybackOutcome)> {
        self.controller.stop();
        let outcome = self.cloud.play_remote(text, language).await?;
        Ok((Route::Cloud, outcome))
    }
}
