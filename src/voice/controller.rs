//! Speech controller: the single owner of speech output
//!
//! At most one [`SpeechSession`] is live. Starting a session first cancels
//! the previous one and waits for its task to wind down, so two utterances
//! never overlap. Backend failures become [`SpeechStatus::Errored`] and are
//! never returned to the caller.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::backend::{SpeechBackend, select_backend};
use super::catalog::{Voice, VoiceCatalog};
use crate::config::VoiceConfig;
use crate::format::to_plain_text;
use crate::{Error, Result};

/// Lifecycle of the current speech session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeechStatus {
    /// Nothing is playing
    #[default]
    Idle,
    /// A session is playing
    Speaking,
    /// The last session was cut short
    Stopped,
    /// The backend failed during the last session
    Errored,
}

/// One playback attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpeechSession {
    /// Session identifier
    pub id: Uuid,
    /// Plain text being spoken
    pub text: String,
    /// Voice used
    pub voice_id: String,
    /// When playback was requested
    pub started_at: DateTime<Utc>,
}

struct ActiveSpeech {
    session: SpeechSession,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// Owns mute, voice selection and the one active speech session
pub struct SpeechController {
    backend: Option<Arc<dyn SpeechBackend>>,
    catalog: VoiceCatalog,
    selected: Mutex<String>,
    muted: AtomicBool,
    active: tokio::sync::Mutex<Option<ActiveSpeech>>,
    status: Arc<watch::Sender<SpeechStatus>>,
}

impl SpeechController {
    /// Create a controller around an already-selected backend
    ///
    /// An unknown `default_voice` falls back to the first catalog entry.
    #[must_use]
    pub fn new(
        backend: Option<Arc<dyn SpeechBackend>>,
        catalog: VoiceCatalog,
        default_voice: &str,
    ) -> Self {
        let selected = if catalog.contains(default_voice) {
            default_voice.to_string()
        } else {
            let fallback = catalog
                .voices()
                .first()
                .map_or_else(|| default_voice.to_string(), |v| v.id.clone());
            tracing::warn!(requested = default_voice, using = %fallback, "default voice not in catalog");
            fallback
        };

        let (status, _) = watch::channel(SpeechStatus::Idle);
        Self {
            backend,
            catalog,
            selected: Mutex::new(selected),
            muted: AtomicBool::new(false),
            active: tokio::sync::Mutex::new(None),
            status: Arc::new(status),
        }
    }

    /// Create a controller, selecting the backend from configuration
    #[must_use]
    pub fn from_config(config: &VoiceConfig) -> Self {
        Self::new(
            select_backend(config),
            VoiceCatalog::default(),
            &config.default_voice,
        )
    }

    /// Whether any synthesis backend is usable
    #[must_use]
    pub fn tts_available(&self) -> bool {
        self.backend.is_some()
    }

    /// Name of the selected backend
    #[must_use]
    pub fn backend_name(&self) -> Option<&'static str> {
        self.backend.as_ref().map(|b| b.name())
    }

    /// Current status
    #[must_use]
    pub fn status(&self) -> SpeechStatus {
        *self.status.borrow()
    }

    /// Watch status changes
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SpeechStatus> {
        self.status.subscribe()
    }

    /// Whether output is muted
    #[must_use]
    pub fn is_muted(&self) -> bool {
        self.muted.load(Ordering::SeqCst)
    }

    /// Voices offered to the user
    #[must_use]
    pub fn available_voices(&self) -> &[Voice] {
        self.catalog.voices()
    }

    /// Currently selected voice identifier
    #[must_use]
    pub fn selected_voice(&self) -> String {
        self.selected
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Select a voice from the catalog
    ///
    /// # Errors
    ///
    /// Returns error if the voice is not in the catalog
    pub fn set_voice(&self, voice_id: &str) -> Result<()> {
        if !self.catalog.contains(voice_id) {
            return Err(Error::UnknownVoice(voice_id.to_string()));
        }
        *self.selected.lock().unwrap_or_else(|e| e.into_inner()) = voice_id.to_string();
        tracing::info!(voice = voice_id, "voice selected");
        Ok(())
    }

    /// The session currently playing, if any
    pub async fn current_session(&self) -> Option<SpeechSession> {
        let active = self.active.lock().await;
        active
            .as_ref()
            .filter(|a| !a.cancel.is_cancelled())
            .map(|a| a.session.clone())
    }

    /// Speak `text`, replacing whatever is playing
    ///
    /// Markup is stripped first. Returns `None` without touching audio when
    /// muted, when no backend is available, or when nothing is left to say.
    /// Must be called from within a tokio runtime.
    pub async fn speak(&self, text: &str, voice_id: &str) -> Option<SpeechSession> {
        self.start(text, voice_id, None).await
    }

    /// Speak `text` unless `guard` is cancelled before playback begins
    ///
    /// The guard is checked again once this call owns the session slot, so
    /// a caller that cancels it and then calls [`Self::stop`] never hears
    /// this text afterwards.
    pub async fn speak_guarded(
        &self,
        text: &str,
        voice_id: &str,
        guard: &CancellationToken,
    ) -> Option<SpeechSession> {
        self.start(text, voice_id, Some(guard)).await
    }

    async fn start(
        &self,
        text: &str,
        voice_id: &str,
        guard: Option<&CancellationToken>,
    ) -> Option<SpeechSession> {
        let backend = Arc::clone(self.backend.as_ref()?);
        if self.is_muted() {
            tracing::debug!("speech muted, skipping");
            return None;
        }

        let plain = to_plain_text(text);
        if plain.is_empty() {
            return None;
        }

        let mut active = self.active.lock().await;
        self.halt(&mut active).await;

        // Mute may have landed while the previous session wound down
        if self.is_muted() {
            return None;
        }
        if guard.is_some_and(CancellationToken::is_cancelled) {
            tracing::trace!("speech withdrawn before start");
            return None;
        }

        let session = SpeechSession {
            id: Uuid::new_v4(),
            text: plain,
            voice_id: voice_id.to_string(),
            started_at: Utc::now(),
        };
        let cancel = CancellationToken::new();

        self.status.send_replace(SpeechStatus::Speaking);
        tracing::info!(session = %session.id, voice = voice_id, backend = backend.name(), "speech started");

        let task = tokio::spawn(run_speech(
            backend,
            session.clone(),
            cancel.clone(),
            Arc::clone(&self.status),
        ));

        *active = Some(ActiveSpeech {
            session: session.clone(),
            cancel,
            task,
        });

        Some(session)
    }

    /// Cancel the active session; a no-op if nothing is speaking
    pub async fn stop(&self) {
        let mut active = self.active.lock().await;
        self.halt(&mut active).await;
    }

    /// Mute or unmute; muting while speaking stops the session
    pub async fn set_muted(&self, muted: bool) {
        let was_muted = self.muted.swap(muted, Ordering::SeqCst);
        if muted == was_muted {
            return;
        }
        tracing::info!(muted, "speech mute changed");
        if muted {
            self.stop().await;
        }
    }

    /// Flip the mute flag, returning the new value
    pub async fn toggle_mute(&self) -> bool {
        let muted = !self.is_muted();
        self.set_muted(muted).await;
        muted
    }

    /// Stop, then speak `text` again
    pub async fn replay(&self, text: &str, voice_id: &str) -> Option<SpeechSession> {
        self.stop().await;
        self.speak(text, voice_id).await
    }

    /// Cancel the session held in `active` and wait for its task to exit
    async fn halt(&self, active: &mut Option<ActiveSpeech>) {
        let Some(previous) = active.take() else {
            return;
        };

        let was_speaking = !previous.cancel.is_cancelled();
        previous.cancel.cancel();
        if let Err(e) = previous.task.await {
            tracing::warn!(session = %previous.session.id, error = %e, "speech task ended abnormally");
        }

        if was_speaking {
            self.status.send_replace(SpeechStatus::Stopped);
            tracing::info!(session = %previous.session.id, "speech stopped");
        }
    }
}

impl std::fmt::Debug for SpeechController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpeechController")
            .field("backend", &self.backend_name())
            .field("selected", &self.selected_voice())
            .field("muted", &self.is_muted())
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}

async fn run_speech(
    backend: Arc<dyn SpeechBackend>,
    session: SpeechSession,
    cancel: CancellationToken,
    status: Arc<watch::Sender<SpeechStatus>>,
) {
    let outcome = tokio::select! {
        () = cancel.cancelled() => None,
        result = backend.speak(&session.text, &session.voice_id) => Some(result),
    };

    // Once cancelled, the canceller owns the status
    match outcome {
        Some(Ok(())) if !cancel.is_cancelled() => {
            status.send_replace(SpeechStatus::Idle);
            tracing::debug!(session = %session.id, "speech finished");
        }
        Some(Err(e)) if !cancel.is_cancelled() => {
            status.send_replace(SpeechStatus::Errored);
            tracing::warn!(session = %session.id, error = %e, "speech failed");
        }
        _ => {}
    }

    cancel.cancel();
}
