/// Reference frontend that renders to stdout.
///
/// Used by the preview tool and the examples; also handy as a smoke-test
/// surface for content packs. Choices resolve through a pluggable strategy
/// so headless runs never block on input.
use async_trait::async_trait;
use std::io::Write;
use std::time::Duration;
use tracing::debug;

use crate::core::fracture::FractureField;
use crate::core::frontend::{AudioHandle, Frontend, SurfaceError};
use crate::schema::script::{ChoiceKind, ChoiceLabels};

pub struct ConsoleFrontend {
    choose: Box<dyn FnMut(&ChoiceLabels) -> ChoiceKind + Send>,
    next_handle: u64,
}

impl ConsoleFrontend {
    /// A console that always complies.
    pub fn new() -> Self {
        Self::with_choices(|_| ChoiceKind::Comply)
    }

    /// A console with a custom choice strategy.
    pub fn with_choices(choose: impl FnMut(&ChoiceLabels) -> ChoiceKind + Send + 'static) -> Self {
        Self {
            choose: Box::new(choose),
            next_handle: 0,
        }
    }

    /// A console cycling through the given kinds, wrapping around.
    pub fn rotating(kinds: Vec<ChoiceKind>) -> Self {
        let mut index = 0usize;
        Self::with_choices(move |_| {
            let kind = if kinds.is_empty() {
                ChoiceKind::Comply
            } else {
                kinds[index % kinds.len()]
            };
            index += 1;
            kind
        })
    }

    fn flush(&self) {
        let _ = std::io::stdout().flush();
    }
}

impl Default for ConsoleFrontend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Frontend for ConsoleFrontend {
    fn push_char(&mut self, ch: char) {
        print!("{ch}");
        self.flush();
    }

    fn line_break(&mut self) {
        println!();
    }

    async fn play_voice(&mut self, voice_id: &str) -> Result<AudioHandle, SurfaceError> {
        debug!(voice_id, "voice dispatch (console, silent)");
        self.next_handle += 1;
        Ok(AudioHandle(self.next_handle))
    }

    fn stop_voice(&mut self, _handle: AudioHandle) {}

    async fn present_choice(&mut self, labels: &ChoiceLabels) -> ChoiceKind {
        println!();
        println!("  [comply] {}", labels.comply);
        println!("  [lie]    {}", labels.lie);
        println!("  [run]    {}", labels.run);
        let kind = (self.choose)(labels);
        println!("  > {}", labels.label_for(kind));
        kind
    }

    fn enter_task_mode(&mut self) {
        println!("--- task ---");
    }

    fn open_task(&mut self, title: &str, description: &str) {
        println!("[{title}] {description}");
    }

    fn clear_task_body(&mut self) {}

    fn exit_task_mode(&mut self) {
        println!("--- end task ---");
    }

    async fn play_transition(&mut self) {
        println!("*** the screen gives way ***");
    }

    fn render_fracture(&mut self, field: &FractureField) -> Result<(), SurfaceError> {
        debug!(
            stage = field.visual_stage(),
            paths = field.visible_paths().count(),
            "fracture overlay"
        );
        Ok(())
    }

    fn apply_glitch(&mut self, duration: Duration) {
        println!("~~~ glitch ({} ms) ~~~", duration.as_millis());
    }

    fn show_shutdown(&mut self, title: &str, body: &str) {
        println!();
        println!("==== {title} ====");
        println!("{body}");
    }

    fn reload(&mut self) {
        println!("(session reloads)");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rotating_strategy_cycles() {
        let labels = ChoiceLabels {
            comply: "a".to_string(),
            lie: "b".to_string(),
            run: "c".to_string(),
        };
        let mut console =
            ConsoleFrontend::rotating(vec![ChoiceKind::Comply, ChoiceKind::Lie, ChoiceKind::Run]);
        assert_eq!(console.present_choice(&labels).await, ChoiceKind::Comply);
        assert_eq!(console.present_choice(&labels).await, ChoiceKind::Lie);
        assert_eq!(console.present_choice(&labels).await, ChoiceKind::Run);
        assert_eq!(console.present_choice(&labels).await, ChoiceKind::Comply);
    }

    #[tokio::test]
    async fn empty_rotation_falls_back_to_comply() {
        let labels = ChoiceLabels {
            comply: "a".to_string(),
            lie: "b".to_string(),
            run: "c".to_string(),
        };
        let mut console = ConsoleFrontend::rotating(Vec::new());
        assert_eq!(console.present_choice(&labels).await, ChoiceKind::Comply);
    }
}
