//! Platform speech synthesis through the system speech command

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use super::backend::SpeechBackend;
use super::catalog::voice_language;
use crate::{Error, Result};

/// Speech commands probed on `PATH`, in preference order
const CANDIDATES: &[(&str, NativeFlavor)] = &[
    ("say", NativeFlavor::Say),
    ("espeak-ng", NativeFlavor::Espeak),
    ("espeak", NativeFlavor::Espeak),
    ("spd-say", NativeFlavor::SpeechDispatcher),
];

/// Command-line dialect of a speech program
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NativeFlavor {
    /// macOS `say`
    Say,
    /// `espeak` / `espeak-ng`
    Espeak,
    /// speech-dispatcher `spd-say`
    SpeechDispatcher,
}

/// Speaks through the platform's speech command
///
/// Text is written to the program's stdin so it is never parsed as
/// arguments. The child is killed when the speak future is dropped;
/// speech-dispatcher plays through a daemon, so it is also told to cancel.
#[derive(Debug, Clone)]
pub struct NativeSpeech {
    program: PathBuf,
    flavor: NativeFlavor,
}

impl NativeSpeech {
    /// Find the first available speech command
    #[must_use]
    pub fn detect() -> Option<Self> {
        CANDIDATES.iter().find_map(|(name, flavor)| {
            which::which(name).ok().map(|program| {
                tracing::debug!(program = %program.display(), "found platform speech command");
                Self {
                    program,
                    flavor: *flavor,
                }
            })
        })
    }

    fn args(&self, voice_id: &str) -> Vec<String> {
        let language = voice_language(voice_id).map(str::to_ascii_lowercase);
        match self.flavor {
            // `say` voices are named per system; leave the default
            NativeFlavor::Say => vec!["-f".to_string(), "-".to_string()],
            NativeFlavor::Espeak => {
                let mut args = vec!["--stdin".to_string()];
                if let Some(lang) = language {
                    args.push("-v".to_string());
                    args.push(lang);
                }
                args
            }
            NativeFlavor::SpeechDispatcher => {
                let mut args = vec!["-e".to_string(), "-w".to_string()];
                if let Some(lang) = language {
                    let primary = lang.split('-').next().unwrap_or("en").to_string();
                    args.push("-l".to_string());
                    args.push(primary);
                }
                args
            }
        }
    }
}

#[async_trait]
impl SpeechBackend for NativeSpeech {
    fn name(&self) -> &'static str {
        "native"
    }

    async fn speak(&self, text: &str, voice_id: &str) -> Result<()> {
        let mut cancel_on_drop = DispatcherCancel::for_backend(self);

        let mut child = Command::new(&self.program)
            .args(self.args(voice_id))
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::Tts(format!("failed to start {}: {e}", self.program.display())))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(text.as_bytes()).await?;
            stdin.shutdown().await?;
        }

        let output = child.wait_with_output().await?;
        cancel_on_drop.disarm();
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Tts(format!(
                "{} exited with {}: {}",
                self.program.display(),
                output.status,
                stderr.trim()
            )));
        }

        Ok(())
    }
}

/// Sends `spd-say -C` if an utterance is abandoned before it finishes
struct DispatcherCancel {
    program: Option<PathBuf>,
}

impl DispatcherCancel {
    /// Armed only for speech-dispatcher, which keeps talking after its client exits
    fn for_backend(speech: &NativeSpeech) -> Self {
        Self {
            program: (speech.flavor == NativeFlavor::SpeechDispatcher).then(|| speech.program.clone()),
        }
    }

    fn disarm(&mut self) {
        self.program = None;
    }
}

impl Drop for DispatcherCancel {
    fn drop(&mut self) {
        let Some(program) = self.program.take() else {
            return;
        };
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            return;
        };

        runtime.spawn(async move {
            let status = Command::new(&program)
                .arg("-C")
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
                .await;
            match status {
                Ok(status) if status.success() => tracing::debug!("speech-dispatcher output cancelled"),
                Ok(status) => tracing::warn!(%status, "speech-dispatcher cancel failed"),
                Err(e) => tracing::warn!(error = %e, "failed to run speech-dispatcher cancel"),
            }
        });
    }
}
