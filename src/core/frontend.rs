/// Frontend boundary — every user-visible effect the engine drives.
///
/// The engine owns sequencing and state; implementations own pixels and
/// sound. Fallible calls here are all degradable: per the error policy the
/// engine logs and continues when they fail.
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::core::fracture::FractureField;
use crate::schema::script::{ChoiceKind, ChoiceLabels};

#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("audio unavailable: {0}")]
    Audio(String),
    #[error("animation unsupported: {0}")]
    Animation(String),
}

/// Opaque handle to a dispatched audio playback, used only to stop it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioHandle(pub u64);

/// The surface the engine renders the experience onto.
///
/// Calls arrive from a single logical thread, strictly sequenced; an
/// implementation never sees overlapping mutation.
#[async_trait]
pub trait Frontend: Send {
    /// Append one revealed character to the active line.
    fn push_char(&mut self, ch: char);

    /// Terminate the active line.
    fn line_break(&mut self);

    /// Dispatch playback of a pre-recorded voice line. Resolving means the
    /// request went out, not that playback finished.
    async fn play_voice(&mut self, voice_id: &str) -> Result<AudioHandle, SurfaceError>;

    /// Stop a previously dispatched playback. Best-effort.
    fn stop_voice(&mut self, handle: AudioHandle);

    /// Present the three options and suspend until the player picks one.
    async fn present_choice(&mut self, labels: &ChoiceLabels) -> ChoiceKind;

    /// Switch the surface into task mode.
    fn enter_task_mode(&mut self);

    /// Show a task's title and description inside task mode.
    fn open_task(&mut self, title: &str, description: &str);

    /// Clear the task body mount point.
    fn clear_task_body(&mut self);

    /// Return the surface to simulation mode.
    fn exit_task_mode(&mut self);

    /// Play the landing-to-simulation transition effect.
    async fn play_transition(&mut self);

    /// Redraw the fracture overlay.
    fn render_fracture(&mut self, field: &FractureField) -> Result<(), SurfaceError>;

    /// Apply a transient punitive glitch.
    fn apply_glitch(&mut self, duration: Duration);

    /// Show the shutdown notice ahead of a forced reload.
    fn show_shutdown(&mut self, title: &str, body: &str);

    /// Perform the full reload that discards session state.
    fn reload(&mut self);
}
