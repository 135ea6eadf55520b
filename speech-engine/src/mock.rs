//! Test doubles for the platform, renderer, audio and translation traits

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{Notify, watch};

use crate::cloud::{AudioPlayback, AudioSink, SpeechRenderer};
use crate::error::{EngineError, PlatformError, Result};
use crate::language::Language;
use crate::platform::{SpeakRequest, SpeechPlatform};
use crate::translate::TranslationStrategy;
use crate::voice::VoiceDescriptor;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformEvent {
    Cancel,
    Speak(String),
}

/// Platform that records every call and completes utterances immediately
/// unless told to hold or fail on a particular sentence.
pub struct MockPlatform {
    catalog: watch::Sender<Vec<VoiceDescriptor>>,
    events: Mutex<Vec<PlatformEvent>>,
    fail_on: Mutex<Option<(String, PlatformError)>>,
    hold_on: Mutex<Option<String>>,
    cancelled: Notify,
}

impl MockPlatform {
    pub fn with_voices(voices: Vec<VoiceDescriptor>) -> Self {
        let (catalog, _) = watch::channel(voices);
        Self {
            catalog,
            events: Mutex::new(Vec::new()),
            fail_on: Mutex::new(None),
            hold_on: Mutex::new(None),
            cancelled: Notify::new(),
        }
    }

    pub fn with_locales(locales: &[&str]) -> Self {
        Self::with_voices(
            locales
                .iter()
                .map(|locale| VoiceDescriptor::new(format!("mock-{}", locale), *locale))
                .collect(),
        )
    }

    pub fn set_voices(&self, voices: Vec<VoiceDescriptor>) {
        self.catalog.send_replace(voices);
    }

    pub fn fail_on(&self, text: &str, error: PlatformError) {
        *self.fail_on.lock().unwrap() = Some((text.to_string(), error));
    }

    /// Keep the utterance with this text speaking until cancelled
    pub fn hold_on(&self, text: &str) {
        *self.hold_on.lock().unwrap() = Some(text.to_string());
    }

    pub fn release_hold(&self) {
        *self.hold_on.lock().unwrap() = None;
    }

    pub fn events(&self) -> Vec<PlatformEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn spoken(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                PlatformEvent::Speak(text) => Some(text),
                PlatformEvent::Cancel => None,
            })
            .collect()
    }

    /// Poll until `text` has been handed to the platform
    pub async fn wait_until_spoken(&self, text: &str) {
        for _ in 0..1000 {
            if self.spoken().iter().any(|t| t == text) {
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        }
        panic!("'{}' was never spoken", text);
    }
}

#[async_trait]
impl SpeechPlatform for MockPlatform {
    fn voices(&self) -> Vec<VoiceDescriptor> {
        self.catalog.borrow().clone()
    }

    async fn voices_changed(&self) {
        let mut rx = self.catalog.subscribe();
        let _ = rx.changed().await;
    }

    async fn speak(&self, request: &SpeakRequest) -> std::result::Result<(), PlatformError> {
        let cancelled = self.cancelled.notified();
        self.events
            .lock()
            .unwrap()
            .push(PlatformEvent::Speak(request.text.clone()));

        let failure = self.fail_on.lock().unwrap().clone();
        if let Some((text, error)) = failure {
            if text == request.text {
                return Err(error);
            }
        }

        let hold = self.hold_on.lock().unwrap().clone();
        if hold.as_deref() == Some(request.text.as_str()) {
            cancelled.await;
            return Err(PlatformError::Interrupted);
        }

        Ok(())
    }

    fn cancel(&self) {
        self.events.lock().unwrap().push(PlatformEvent::Cancel);
        self.cancelled.notify_waiters();
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RenderBehavior {
    Succeed,
    Fail,
    Hang,
}

/// Renderer that returns fixed bytes, a fixed error, or never finishes
pub struct MockRenderer {
    pub requests: Mutex<Vec<(String, Language)>>,
    behavior: RenderBehavior,
}

impl MockRenderer {
    fn with_behavior(behavior: RenderBehavior) -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            behavior,
        }
    }

    pub fn always_succeeds() -> Self {
        Self::with_behavior(RenderBehavior::Succeed)
    }

    pub fn always_fails() -> Self {
        Self::with_behavior(RenderBehavior::Fail)
    }

    /// Records the request, then stays pending until dropped
    pub fn never_finishes() -> Self {
        Self::with_behavior(RenderBehavior::Hang)
    }

    pub fn rendered(&self) -> Vec<(String, Language)> {
        self.requests.lock().unwrap().clone()
    }

    pub async fn wait_until_rendered(&self, count: usize) {
        for _ in 0..1000 {
            if self.rendered().len() >= count {
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        }
        panic!("renderer never received {} requests", count);
    }
}

#[async_trait]
impl SpeechRenderer for MockRenderer {
    async fn render(&self, text: &str, language: Language) -> Result<Vec<u8>> {
        self.requests
            .lock()
            .unwrap()
            .push((text.to_string(), language));
        match self.behavior {
            RenderBehavior::Succeed => Ok(text.as_bytes().to_vec()),
            RenderBehavior::Fail => Err(EngineError::RemoteRender {
                message: "TTS failed: upstream unavailable".to_string(),
                status_code: Some(500),
            }),
            RenderBehavior::Hang => std::future::pending().await,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkEvent {
    Start(usize),
    Stop(usize),
}

/// Audio sink whose playbacks finish at once, or run until stopped
pub struct MockSink {
    events: Arc<Mutex<Vec<SinkEvent>>>,
    next_id: AtomicUsize,
    run_until_stopped: bool,
}

impl MockSink {
    pub fn finishing() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
            next_id: AtomicUsize::new(0),
            run_until_stopped: false,
        }
    }

    pub fn endless() -> Self {
        Self {
            run_until_stopped: true,
            ..Self::finishing()
        }
    }

    pub fn events(&self) -> Vec<SinkEvent> {
        self.events.lock().unwrap().clone()
    }

    pub async fn wait_until_started(&self, count: usize) {
        for _ in 0..1000 {
            let started = self
                .events()
                .iter()
                .filter(|e| matches!(e, SinkEvent::Start(_)))
                .count();
            if started >= count {
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        }
        panic!("sink never started {} playbacks", count);
    }
}

impl AudioSink for MockSink {
    fn start(&self, _audio: Vec<u8>) -> Result<Box<dyn AudioPlayback>> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.events.lock().unwrap().push(SinkEvent::Start(id));
        Ok(Box::new(MockPlayback {
            id,
            events: Arc::clone(&self.events),
            stopped: Arc::new(Notify::new()),
            run_until_stopped: self.run_until_stopped,
        }))
    }
}

struct MockPlayback {
    id: usize,
    events: Arc<Mutex<Vec<SinkEvent>>>,
    stopped: Arc<Notify>,
    run_until_stopped: bool,
}

#[async_trait]
impl AudioPlayback for MockPlayback {
    async fn wait(&self) -> Result<()> {
        if self.run_until_stopped {
            self.stopped.notified().await;
        }
        Ok(())
    }

    fn stop(&self) {
        self.events.lock().unwrap().push(SinkEvent::Stop(self.id));
        self.stopped.notify_one();
    }
}

/// Translation strategy with a canned result
pub struct MockTranslation {
    name: &'static str,
    result: std::result::Result<String, String>,
    hang: bool,
    pub calls: AtomicUsize,
}

impl MockTranslation {
    pub fn returns(name: &'static str, text: &str) -> Self {
        Self {
            name,
            result: Ok(text.to_string()),
            hang: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn fails(name: &'static str, message: &str) -> Self {
        Self {
            name,
            result: Err(message.to_string()),
            hang: false,
            calls: AtomicUsize::new(0),
        }
    }

    /// Counts the call, then stays pending until dropped
    pub fn never_finishes(name: &'static str) -> Self {
        Self {
            hang: true,
            ..Self::fails(name, "unreachable")
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub async fn wait_until_called(&self) {
        for _ in 0..1000 {
            if self.call_count() > 0 {
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        }
        panic!("{} was never called", self.name);
    }
}

#[async_trait]
impl TranslationStrategy for MockTranslation {
    async fn translate(&self, _text: &str, _target: Language) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.hang {
            return std::future::pending().await;
        }
        self.result.clone().map_err(|message| EngineError::Service {
            message,
            status_code: None,
        })
    }

    fn name(&self) -> &str {
        self.name
    }
}
