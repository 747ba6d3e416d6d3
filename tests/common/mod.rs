//! Shared test scaffolding: a recording frontend whose journal outlives
//! the engine that owns it, plus a counting task routine.
#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use shatter_engine::core::fracture::FractureField;
use shatter_engine::core::frontend::{AudioHandle, Frontend, SurfaceError};
use shatter_engine::core::registry::TaskRoutine;
use shatter_engine::core::sequencer::TaskContext;
use shatter_engine::schema::script::{ChoiceKind, ChoiceLabels};
use shatter_engine::schema::task::{TaskArgs, TaskOutcome};

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Char(char),
    Break,
    Play(String),
    Stop(u64),
    ChoiceShown,
    TaskModeIn,
    TaskModeOut,
    TaskOpened(String),
    Transition,
    Render(u32),
    Glitch,
    Shutdown(String, String),
    Reload,
}

/// Shared view into everything the frontend was asked to do. Clones point
/// at the same log, so tests keep one while the engine owns the frontend.
#[derive(Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<Event>>>);

impl Journal {
    pub fn push(&self, event: Event) {
        self.0.lock().unwrap().push(event);
    }

    pub fn events(&self) -> Vec<Event> {
        self.0.lock().unwrap().clone()
    }

    /// The revealed transcript: characters joined, breaks as newlines.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for event in self.events() {
            match event {
                Event::Char(ch) => out.push(ch),
                Event::Break => out.push('\n'),
                _ => {}
            }
        }
        out
    }

    pub fn count(&self, pred: impl Fn(&Event) -> bool) -> usize {
        self.events().iter().filter(|e| pred(e)).count()
    }
}

pub struct RecordingFrontend {
    journal: Journal,
    choices: VecDeque<ChoiceKind>,
    next_handle: u64,
    pub fail_audio: bool,
}

impl RecordingFrontend {
    /// Build a frontend that answers choices from the given queue (and
    /// lies once the queue runs dry), returning the shared journal.
    pub fn new(choices: Vec<ChoiceKind>) -> (Self, Journal) {
        let journal = Journal::default();
        (
            Self {
                journal: journal.clone(),
                choices: choices.into(),
                next_handle: 0,
                fail_audio: false,
            },
            journal,
        )
    }
}

#[async_trait]
impl Frontend for RecordingFrontend {
    fn push_char(&mut self, ch: char) {
        self.journal.push(Event::Char(ch));
    }

    fn line_break(&mut self) {
        self.journal.push(Event::Break);
    }

    async fn play_voice(&mut self, voice_id: &str) -> Result<AudioHandle, SurfaceError> {
        if self.fail_audio {
            return Err(SurfaceError::Audio("test device missing".to_string()));
        }
        self.journal.push(Event::Play(voice_id.to_string()));
        self.next_handle += 1;
        Ok(AudioHandle(self.next_handle))
    }

    fn stop_voice(&mut self, handle: AudioHandle) {
        self.journal.push(Event::Stop(handle.0));
    }

    async fn present_choice(&mut self, _labels: &ChoiceLabels) -> ChoiceKind {
        self.journal.push(Event::ChoiceShown);
        self.choices.pop_front().unwrap_or(ChoiceKind::Lie)
    }

    fn enter_task_mode(&mut self) {
        self.journal.push(Event::TaskModeIn);
    }

    fn open_task(&mut self, title: &str, _description: &str) {
        self.journal.push(Event::TaskOpened(title.to_string()));
    }

    fn clear_task_body(&mut self) {}

    fn exit_task_mode(&mut self) {
        self.journal.push(Event::TaskModeOut);
    }

    async fn play_transition(&mut self) {
        self.journal.push(Event::Transition);
    }

    fn render_fracture(&mut self, field: &FractureField) -> Result<(), SurfaceError> {
        self.journal.push(Event::Render(field.visual_stage()));
        Ok(())
    }

    fn apply_glitch(&mut self, _duration: Duration) {
        self.journal.push(Event::Glitch);
    }

    fn show_shutdown(&mut self, title: &str, body: &str) {
        self.journal
            .push(Event::Shutdown(title.to_string(), body.to_string()));
    }

    fn reload(&mut self) {
        self.journal.push(Event::Reload);
    }
}

/// A routine that counts invocations, optionally reports an answer, and
/// optionally demands a session reset.
pub struct ScriptedRoutine {
    pub invocations: Arc<AtomicU32>,
    pub answer: Option<String>,
    pub reset_reason: Option<(String, String)>,
}

impl ScriptedRoutine {
    pub fn counting(invocations: Arc<AtomicU32>) -> Self {
        Self {
            invocations,
            answer: None,
            reset_reason: None,
        }
    }
}

#[async_trait]
impl TaskRoutine for ScriptedRoutine {
    async fn run(&self, ctx: &mut TaskContext<'_>, _args: &TaskArgs) -> TaskOutcome {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        ctx.open("PROCEDURE", "scripted test routine");
        if let Some((title, body)) = &self.reset_reason {
            ctx.request_reset(title.clone(), body.clone());
        }
        match &self.answer {
            Some(answer) => {
                ctx.set_answer(answer.clone());
                TaskOutcome::answered(answer.clone())
            }
            None => TaskOutcome::empty(),
        }
    }
}
