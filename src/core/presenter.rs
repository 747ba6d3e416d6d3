/// Synchronized presentation pipeline.
///
/// Paces on-screen text reveal against either a known voice-line duration
/// or a words-per-minute heuristic, dispatching audio concurrently. A line
/// resolves once its text is fully revealed and its audio request has gone
/// out; audio completion is never awaited. Newer lines supersede stale
/// audio through the play-token mechanism.
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;
use tracing::debug;

use crate::core::frontend::{AudioHandle, Frontend};
use crate::schema::script::Line;

#[derive(Debug, Error)]
pub enum VoiceBankError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
}

const MS_PER_WORD: u64 = 60_000 / 300;
const SETTLE_MS: u64 = 650;
const MIN_LINE_MS: u64 = 1_100;
const MIN_REVEAL_MS: u64 = 450;

/// Durations of the pre-recorded voice lines, keyed by voice id.
/// Transcript content lives with the assets; the engine only needs timing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VoiceBank {
    entries: HashMap<String, u64>,
}

impl VoiceBank {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load_from_ron(path: &Path) -> Result<VoiceBank, VoiceBankError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    pub fn parse_ron(input: &str) -> Result<VoiceBank, VoiceBankError> {
        Ok(ron::from_str(input)?)
    }

    pub fn insert(&mut self, id: impl Into<String>, duration_ms: u64) {
        self.entries.insert(id.into(), duration_ms);
    }

    pub fn duration_ms(&self, id: &str) -> Option<u64> {
        self.entries.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Monotonically increasing play token for one voice channel. A playback
/// started under token `t` stays valid only while `t` is the newest token.
#[derive(Debug, Default)]
pub struct VoiceChannel {
    token: u64,
    current: Option<AudioHandle>,
}

impl VoiceChannel {
    /// Claim the next token, invalidating whatever played before.
    pub fn begin(&mut self) -> u64 {
        self.token += 1;
        self.token
    }

    pub fn is_current(&self, token: u64) -> bool {
        self.token == token
    }

    pub fn take_current(&mut self) -> Option<AudioHandle> {
        self.current.take()
    }

    pub fn set_current(&mut self, handle: AudioHandle) {
        self.current = Some(handle);
    }
}

/// The line-by-line presentation pipeline. Lines are processed strictly
/// sequentially by the sequencer; this type never sees concurrent calls.
#[derive(Debug, Default)]
pub struct Presenter {
    voices: VoiceBank,
    channel: VoiceChannel,
}

impl Presenter {
    pub fn new(voices: VoiceBank) -> Self {
        Self {
            voices,
            channel: VoiceChannel::default(),
        }
    }

    /// Target reveal duration for a line: the known voice duration when the
    /// bank has one, otherwise the word-rate heuristic, floored overall.
    pub fn reveal_duration(&self, line: &Line) -> Duration {
        let base = line
            .voice
            .as_deref()
            .and_then(|id| self.voices.duration_ms(id))
            .unwrap_or_else(|| {
                (line.word_count() as u64 * MS_PER_WORD + SETTLE_MS).max(MIN_LINE_MS)
            });
        Duration::from_millis(base.max(MIN_REVEAL_MS))
    }

    /// Reveal one line. Resolves once the text is out and the audio request
    /// has been dispatched. Audio failures are logged and swallowed; the
    /// revealed text is the source of truth.
    pub async fn emit_line(&mut self, frontend: &mut dyn Frontend, line: &Line) {
        let token = self.channel.begin();
        if let Some(prev) = self.channel.take_current() {
            frontend.stop_voice(prev);
        }
        if let Some(voice) = line.voice.as_deref() {
            match frontend.play_voice(voice).await {
                Ok(handle) => {
                    if self.channel.is_current(token) {
                        self.channel.set_current(handle);
                    } else {
                        // A newer line claimed the channel while the
                        // dispatch was in flight.
                        frontend.stop_voice(handle);
                    }
                }
                Err(err) => {
                    debug!(voice, %err, "voice dispatch failed, continuing without audio");
                }
            }
        }
        let total = self.reveal_duration(line);
        let chars: Vec<char> = line.text.chars().collect();
        if chars.is_empty() {
            sleep(total).await;
        } else {
            let step = total / chars.len() as u32;
            for ch in chars {
                frontend.push_char(ch);
                sleep(step).await;
            }
        }
        frontend.line_break();
    }
}
