//! Audio playback for synthesized speech

use std::io::Write;
use std::path::PathBuf;
use std::process::Stdio;

use tokio::process::Command;

use crate::{Error, Result};

/// Audio players probed on `PATH`, with the flags that keep them quiet
const PLAYERS: &[(&str, &[&str])] = &[
    ("afplay", &[]),
    ("mpg123", &["-q"]),
    ("mpv", &["--no-video", "--really-quiet"]),
    ("ffplay", &["-nodisp", "-autoexit", "-loglevel", "quiet"]),
];

/// Plays MP3 audio until finished or until the play future is dropped
#[derive(Debug, Clone)]
pub enum AudioPlayer {
    /// External player fed a temporary file
    Command {
        /// Player executable
        program: PathBuf,
        /// Flags passed before the file path
        args: Vec<String>,
    },
    /// Decode in-process and write to the default output device
    #[cfg(feature = "speaker")]
    Speaker,
}

impl AudioPlayer {
    /// Pick the best available player
    #[must_use]
    pub fn detect() -> Option<Self> {
        #[cfg(feature = "speaker")]
        if speaker::output_available() {
            return Some(Self::Speaker);
        }

        PLAYERS.iter().find_map(|(name, args)| {
            which::which(name).ok().map(|program| Self::Command {
                program,
                args: args.iter().map(ToString::to_string).collect(),
            })
        })
    }

    /// Use a specific external player with no extra flags
    #[must_use]
    pub fn command(program: impl Into<PathBuf>) -> Self {
        Self::Command {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Play MP3 bytes to completion
    ///
    /// # Errors
    ///
    /// Returns error if the audio cannot be staged or the player fails
    pub async fn play_mp3(&self, audio: Vec<u8>) -> Result<()> {
        if audio.is_empty() {
            return Ok(());
        }

        match self {
            Self::Command { program, args } => play_with_command(program, args, &audio).await,
            #[cfg(feature = "speaker")]
            Self::Speaker => speaker::play(audio).await,
        }
    }
}

async fn play_with_command(program: &PathBuf, args: &[String], audio: &[u8]) -> Result<()> {
    let mut file = tempfile::Builder::new()
        .prefix("aikya-speech-")
        .suffix(".mp3")
        .tempfile()?;
    file.write_all(audio)?;
    file.flush()?;

    let mut child = Command::new(program)
        .args(args)
        .arg(file.path())
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| Error::Audio(format!("failed to start {}: {e}", program.display())))?;

    let status = child.wait().await?;
    if !status.success() {
        return Err(Error::Audio(format!(
            "{} exited with {status}",
            program.display()
        )));
    }

    tracing::debug!(bytes = audio.len(), "playback complete");
    Ok(())
}

#[cfg(feature = "speaker")]
mod speaker {
    use std::io::Cursor;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
    use cpal::{SampleRate, StreamConfig};

    use crate::{Error, Result};

    /// Sample rate for playback (matches common TTS output)
    const PLAYBACK_SAMPLE_RATE: u32 = 24000;

    /// Raises the stop flag when the play future is dropped
    struct StopOnDrop(Arc<AtomicBool>);

    impl Drop for StopOnDrop {
        fn drop(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    pub fn output_available() -> bool {
        cpal::default_host().default_output_device().is_some()
    }

    pub async fn play(mp3: Vec<u8>) -> Result<()> {
        let stop = Arc::new(AtomicBool::new(false));
        let _guard = StopOnDrop(Arc::clone(&stop));

        tokio::task::spawn_blocking(move || {
            let samples = decode_mp3(&mp3)?;
            play_blocking(samples, &stop)
        })
        .await
        .map_err(|e| Error::Audio(format!("playback task failed: {e}")))?
    }

    fn output_config(device: &cpal::Device) -> Result<StreamConfig> {
        let rate = SampleRate(PLAYBACK_SAMPLE_RATE);
        let supported = device
            .supported_output_configs()
            .map_err(|e| Error::Audio(e.to_string()))?
            .find(|c| {
                (c.channels() == 1 || c.channels() == 2)
                    && c.min_sample_rate() <= rate
                    && c.max_sample_rate() >= rate
            })
            .ok_or_else(|| Error::Audio("no suitable output config found".to_string()))?;

        Ok(supported.with_sample_rate(rate).config())
    }

    fn play_blocking(samples: Vec<f32>, stop: &Arc<AtomicBool>) -> Result<()> {
        if samples.is_empty() {
            return Ok(());
        }

        let device = cpal::default_host()
            .default_output_device()
            .ok_or_else(|| Error::Audio("no output device available".to_string()))?;
        let config = output_config(&device)?;
        let channels = config.channels as usize;

        let total = samples.len();
        let position = Arc::new(AtomicUsize::new(0));
        let cursor = Arc::clone(&position);
        let halted = Arc::clone(stop);

        let stream = device
            .build_output_stream(
                &config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    for frame in data.chunks_mut(channels) {
                        let pos = cursor.load(Ordering::Relaxed);
                        let sample = if halted.load(Ordering::Relaxed) || pos >= total {
                            0.0
                        } else {
                            cursor.store(pos + 1, Ordering::Relaxed);
                            samples[pos]
                        };
                        frame.fill(sample);
                    }
                },
                |err| {
                    tracing::error!(error = %err, "audio playback error");
                },
                None,
            )
            .map_err(|e| Error::Audio(e.to_string()))?;

        stream.play().map_err(|e| Error::Audio(e.to_string()))?;

        let duration_ms = (total as u64 * 1000) / u64::from(PLAYBACK_SAMPLE_RATE);
        let deadline = Instant::now() + Duration::from_millis(duration_ms + 500);

        while position.load(Ordering::Relaxed) < total
            && !stop.load(Ordering::Relaxed)
            && Instant::now() < deadline
        {
            std::thread::sleep(Duration::from_millis(50));
        }

        drop(stream);
        tracing::debug!(samples = total, stopped = stop.load(Ordering::Relaxed), "playback complete");
        Ok(())
    }

    /// Decode MP3 bytes to mono f32 samples
    fn decode_mp3(mp3_data: &[u8]) -> Result<Vec<f32>> {
        let mut decoder = minimp3::Decoder::new(Cursor::new(mp3_data));
        let mut samples = Vec::new();

        loop {
            match decoder.next_frame() {
                Ok(frame) => {
                    if frame.channels == 2 {
                        samples.extend(frame.data.chunks(2).map(|chunk| {
                            let left = f32::from(chunk[0]) / 32768.0;
                            let right = f32::from(chunk.get(1).copied().unwrap_or(chunk[0])) / 32768.0;
                            f32::midpoint(left, right)
                        }));
                    } else {
                        samples.extend(frame.data.iter().map(|&s| f32::from(s) / 32768.0));
                    }
                }
                Err(minimp3::Error::Eof) => break,
                Err(e) => return Err(Error::Audio(format!("MP3 decode error: {e}"))),
            }
        }

        Ok(samples)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_audio_is_a_no_op() {
        let player = AudioPlayer::command("/nonexistent/player");
        assert!(player.play_mp3(Vec::new()).await.is_ok());
    }

    #[tokio::test]
    async fn missing_player_is_an_audio_error() {
        let player = AudioPlayer::command("/nonexistent/player");
        let err = player.play_mp3(vec![0xff, 0xfb]).await.unwrap_err();
        assert!(matches!(err, Error::Audio(_)));
    }

    #[test]
    fn probed_players_all_decode_mp3() {
        let names: Vec<&str> = PLAYERS.iter().map(|(name, _)| *name).collect();
        assert_eq!(names, ["afplay", "mpg123", "mpv", "ffplay"]);
        // PCM-only sinks cannot take the synthesized MP3 directly
        assert!(!names.contains(&"paplay"));
        assert!(!names.contains(&"aplay"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn successful_player_completes() {
        let player = AudioPlayer::command("true");
        assert!(player.play_mp3(vec![0xff, 0xfb]).await.is_ok());
    }
}
