// Command-line audio player sink for cloud-rendered speech

use async_trait::async_trait;
use speech_engine::{AudioPlayback, AudioSink, EngineError};
use std::io::Write;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::{Mutex, PoisonError};
use tokio::process::Command;
use tokio::sync::oneshot;

type PlaybackResult = speech_engine::Result<()>;

/// Plays audio by writing it to a temp file and running a player command
/// (e.g., `afplay`, `mpv --no-video`, `ffplay -nodisp -autoexit`).
pub struct CommandSink {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandSink {
    /// Build a sink from a player command line, resolving the program on PATH
    pub fn new(command_line: &str) -> anyhow::Result<Self> {
        let mut parts = command_line.split_whitespace();
        let program = parts
            .next()
            .ok_or_else(|| anyhow::anyhow!("Audio player command is empty"))?;
        let program = which::which(program)
            .map_err(|_| anyhow::anyhow!("Audio player not found: {}", program))?;

        Ok(Self {
            program,
            args: parts.map(String::from).collect(),
        })
    }
}

impl AudioSink for CommandSink {
    fn start(&self, audio: Vec<u8>) -> speech_engine::Result<Box<dyn AudioPlayback>> {
        let mut file = tempfile::Builder::new()
            .prefix("talkify-")
            .suffix(".mp3")
            .tempfile()?;
        file.write_all(&audio)?;
        file.flush()?;

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg(file.path())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                EngineError::Audio(format!(
                    "Failed to start {}: {}",
                    self.program.display(),
                    e
                ))
            })?;

        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let (done_tx, done_rx) = oneshot::channel::<PlaybackResult>();

        tokio::spawn(async move {
            let result = tokio::select! {
                status = child.wait() => match status {
                    Ok(status) if status.success() => Ok(()),
                    Ok(status) => Err(EngineError::Audio(format!(
                        "Player exited with status: {}",
                        status
                    ))),
                    Err(e) => Err(EngineError::Io(e)),
                },
                _ = stop_rx => {
                    let _ = child.kill().await;
                    Ok(())
                }
            };
            // The audio file lives exactly as long as the player
            drop(file);
            let _ = done_tx.send(result);
        });

        Ok(Box::new(CommandPlayback {
            stop: Mutex::new(Some(stop_tx)),
            done: Mutex::new(Some(done_rx)),
        }))
    }
}

struct CommandPlayback {
    stop: Mutex<Option<oneshot::Sender<()>>>,
    done: Mutex<Option<oneshot::Receiver<PlaybackResult>>>,
}

#[async_trait]
impl AudioPlayback for CommandPlayback {
    async fn wait(&self) -> PlaybackResult {
        let done = self
            .done
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        match done {
            Some(done) => done.await.unwrap_or(Ok(())),
            None => Ok(()),
        }
    }

    fn stop(&self) {
        let stop = self
            .stop
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(stop) = stop {
            let _ = stop.send(());
        }
    }
}
