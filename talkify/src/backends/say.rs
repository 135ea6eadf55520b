// macOS say command speech platform

use async_trait::async_trait;
use speech_engine::{PlatformError, SpeakRequest, SpeechPlatform, VoiceDescriptor};
use std::process::Stdio;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::sync::{oneshot, watch};

/// Speech platform backed by the macOS `say` command.
///
/// The voice catalog is loaded in the background from `say -v ?`, so it
/// starts out empty. Each utterance runs its own `say` process.
pub struct SayPlatform {
    catalog: watch::Sender<Vec<VoiceDescriptor>>,
    /// Program and leading arguments run for each utterance
    command: Vec<String>,
    rate: Option<u32>,
    /// Interrupts the utterance currently speaking
    current: Mutex<Option<oneshot::Sender<()>>>,
}

impl SayPlatform {
    /// Create the platform and start loading its voice catalog.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(rate: Option<u32>) -> Arc<Self> {
        let platform = Arc::new(Self::with_command(vec!["say".to_string()], rate));

        let loader = Arc::clone(&platform);
        tokio::spawn(async move {
            match load_voices().await {
                Ok(voices) => {
                    log::debug!("Loaded {} say voices", voices.len());
                    loader.catalog.send_replace(voices);
                }
                Err(e) => log::warn!("Could not list say voices: {}", e),
            }
        });

        platform
    }

    fn with_command(command: Vec<String>, rate: Option<u32>) -> Self {
        let (catalog, _) = watch::channel(Vec::new());
        Self {
            catalog,
            command,
            rate,
            current: Mutex::new(None),
        }
    }

    /// Whether the `say` command can be found at all
    pub fn is_available() -> bool {
        which::which("say").is_ok()
    }

    fn take_current(&self) -> Option<oneshot::Sender<()>> {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

async fn load_voices() -> Result<Vec<VoiceDescriptor>, String> {
    let output = Command::new("say")
        .arg("-v")
        .arg("?")
        .output()
        .await
        .map_err(|e| format!("Failed to run say -v ?: {}", e))?;

    if !output.status.success() {
        return Err(format!("say -v ? failed with status: {}", output.status));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(parse_voice_list(&stdout))
}

/// Parse voice list output from `say -v ?`
///
/// Format: "Name    language  # description". Names may contain spaces,
/// so the locale is taken as the last word before the `#`.
fn parse_voice_list(output: &str) -> Vec<VoiceDescriptor> {
    output
        .lines()
        .filter_map(|line| {
            let entry = line.split('#').next().unwrap_or_default().trim();
            let (name, locale) = entry.rsplit_once(char::is_whitespace)?;
            let name = name.trim();
            if name.is_empty() || locale.is_empty() {
                return None;
            }
            Some(VoiceDescriptor::new(name, locale))
        })
        .collect()
}

#[async_trait]
impl SpeechPlatform for SayPlatform {
    fn voices(&self) -> Vec<VoiceDescriptor> {
        self.catalog.borrow().clone()
    }

    async fn voices_changed(&self) {
        let mut rx = self.catalog.subscribe();
        let _ = rx.changed().await;
    }

    async fn speak(&self, request: &SpeakRequest) -> Result<(), PlatformError> {
        let (program, leading) = self
            .command
            .split_first()
            .ok_or_else(|| PlatformError::Failed("No speech command configured".to_string()))?;

        // Registered before the process exists so a cancel can never miss it
        let (interrupt_tx, mut interrupt_rx) = oneshot::channel();
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = Some(interrupt_tx);

        let mut cmd = Command::new(program);
        cmd.args(leading).arg("-v").arg(&request.voice.name);

        if let Some(rate) = self.rate {
            cmd.arg("-r").arg(rate.to_string());
        }

        // Pass text via stdin to avoid shell escaping issues
        cmd.stdin(Stdio::piped()).kill_on_drop(true);

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                self.take_current();
                return Err(PlatformError::Failed(format!("Failed to spawn {}: {}", program, e)));
            }
        };
        let mut stdin = child.stdin.take();

        tokio::select! {
            biased;
            _ = &mut interrupt_rx => {
                let _ = child.kill().await;
                Err(PlatformError::Interrupted)
            }
            status = async {
                if let Some(mut stdin) = stdin.take() {
                    stdin.write_all(request.text.as_bytes()).await?;
                }
                child.wait().await
            } => {
                self.take_current();
                let status = status
                    .map_err(|e| PlatformError::Failed(format!("Failed to run {}: {}", program, e)))?;
                if status.success() {
                    Ok(())
                } else {
                    Err(PlatformError::Failed(format!("{} command failed with status: {}", program, status)))
                }
            }
        }
    }

    fn cancel(&self) {
        if let Some(interrupt) = self.take_current() {
            let _ = interrupt.send(());
        }
    }

    fn name(&self) -> &str {
        "macos-say"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_voice_list() {
        let output = r#"Alex                en_US    # Most people recognize me by my voice.
Daniel              en_GB    # Hello, my name is Daniel. I am a British-English voice.
Lekha               hi_IN    # नमस्कार, मेरा नाम लेखा है।
Bad News            en_US    # The light you see at the end of the tunnel is the headlamp of a fast approaching train.
"#;
        let voices = parse_voice_list(output);
        assert_eq!(voices.len(), 4);
        assert_eq!(voices[0], VoiceDescriptor::new("Alex", "en_US"));
        assert_eq!(voices[2].locale, "hi_IN");
        assert_eq!(voices[3].name, "Bad News");
    }

    #[test]
    fn test_parse_skips_malformed_lines() {
        let voices = parse_voice_list("\nLonelyName\n   # comment only\n");
        assert!(voices.is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_cancel_interrupts_running_utterance() {
        // Stands in for a long `say` run and ignores its arguments
        let platform = Arc::new(SayPlatform::with_command(
            vec!["sh".into(), "-c".into(), "exec sleep 30".into()],
            None,
        ));
        let request = SpeakRequest {
            text: "A long sentence.".to_string(),
            locale: "en-US".to_string(),
            voice: VoiceDescriptor::new("Alex", "en_US"),
        };

        let speaking = {
            let platform = Arc::clone(&platform);
            tokio::spawn(async move { platform.speak(&request).await })
        };
        while platform.current.lock().unwrap().is_none() {
            tokio::task::yield_now().await;
        }

        platform.cancel();

        let result = tokio::time::timeout(std::time::Duration::from_secs(5), speaking)
            .await
            .expect("cancel did not stop the speech process")
            .unwrap();
        assert_eq!(result, Err(PlatformError::Interrupted));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_speak_reports_command_failure() {
        let platform = SayPlatform::with_command(
            vec!["sh".into(), "-c".into(), "exit 3".into()],
            None,
        );
        let request = SpeakRequest {
            text: "Hello.".to_string(),
            locale: "en-US".to_string(),
            voice: VoiceDescriptor::new("Alex", "en_US"),
        };

        let result = platform.speak(&request).await;
        assert!(matches!(result, Err(PlatformError::Failed(_))));
        assert!(platform.current.lock().unwrap().is_none());
    }

    #[test]
    fn test_parsed_voices_resolve_by_locale() {
        let voices = parse_voice_list("Lekha    hi_IN    # hello\nAlex    en_US    # hi\n");
        let voice = speech_engine::resolve_strict(speech_engine::Language::Hi, &voices).unwrap();
        assert_eq!(voice.name, "Lekha");
    }
}
