/// Step sequencer and session state machine.
///
/// Owns the session lifecycle (landing, transition, simulation, forced
/// reset) and interprets the script strictly in order, driving the
/// presenter, the compliance tracker, the task registry, and the fracture
/// generator. Everything runs on one logical thread; `&mut Engine` makes
/// re-entrant mutation unrepresentable.
use std::time::Duration;
use thiserror::Error;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::core::compliance::{ComplianceTracker, Verdict};
use crate::core::fracture::{stage_for_interactions, FractureField};
use crate::core::frontend::Frontend;
use crate::core::presenter::{Presenter, VoiceBank};
use crate::core::registry::{Resolution, TaskRegistry};
use crate::core::rng::SessionRng;
use crate::schema::script::{ChoiceLabels, Line, Script, ScriptError, Step};
use crate::schema::task::{TaskArgs, Value};

/// Interaction count at which the landing screen gives way.
pub const SHATTER_THRESHOLD: u32 = 23;

const CLICK_COOLDOWN: Duration = Duration::from_millis(180);
const TRANSITION_HOLD: Duration = Duration::from_millis(1_800);
const POST_TASK_PAUSE: Duration = Duration::from_millis(600);
const FORCE_SKIP_PAUSE: Duration = Duration::from_millis(450);
const RELOAD_DELAY: Duration = Duration::from_millis(6_000);

const MISSING_TASK_LINE: &str = "...procedure missing from the archive. moving on.";
const EMPTY_POOL_LINE: &str = "...no procedures available. moving on.";

/// The id whose steps resolve through the named pools instead of a
/// concrete routine.
const RANDOM_TASK_ID: &str = "random";

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("configuration missing: {0}")]
    Configuration(&'static str),
    #[error("script error: {0}")]
    Script(#[from] ScriptError),
}

/// Top-level session phase. Monotonic; only a full reload returns to
/// `Landing`, by rebuilding the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStage {
    Landing,
    Transitioning,
    Simulation,
}

/// What a landing interaction amounted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionOutcome {
    /// Cooldown-suppressed, or not in the landing stage.
    Ignored,
    /// Accepted; carries the fracture stage after recalculation.
    Registered { fracture_stage: u32 },
    /// The shatter threshold was crossed and the transition ran.
    Shattered,
}

/// How a script run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    /// A compliance breach or a task-requested reset tore the session down.
    Reset,
}

enum StepFlow {
    Continue,
    Abort,
}

/// Optional admin-inspection listener. Both signals are also mirrored as
/// tracing events; a missing observer is harmless.
pub trait Observer: Send {
    fn task_starting(&mut self, id: &str, args: &TaskArgs) {
        let _ = (id, args);
    }
    fn answer_recorded(&mut self, answer: &str) {
        let _ = answer;
    }
}

struct ResetRequest {
    title: String,
    body: String,
}

/// What a task routine gets to touch while it runs. Everything else stays
/// with the engine.
pub struct TaskContext<'a> {
    frontend: &'a mut dyn Frontend,
    difficulty_offset: u32,
    answer: Option<String>,
    reset_request: Option<ResetRequest>,
}

impl<'a> TaskContext<'a> {
    pub fn new(frontend: &'a mut dyn Frontend, difficulty_offset: u32) -> Self {
        Self {
            frontend,
            difficulty_offset,
            answer: None,
            reset_request: None,
        }
    }

    /// Show this task's title and description on the task surface.
    pub fn open(&mut self, title: &str, description: &str) {
        self.frontend.open_task(title, description);
    }

    /// Clear the task body mount point.
    pub fn clear_body(&mut self) {
        self.frontend.clear_task_body();
    }

    /// Report the player's answer. Overrides whatever the routine later
    /// returns in its outcome.
    pub fn set_answer(&mut self, answer: impl Into<String>) {
        self.answer = Some(answer.into());
    }

    /// Ask for a full session reset once this task returns.
    pub fn request_reset(&mut self, title: impl Into<String>, body: impl Into<String>) {
        self.reset_request = Some(ResetRequest {
            title: title.into(),
            body: body.into(),
        });
    }

    /// Read-only difficulty bump derived from accumulated resistance.
    pub fn difficulty_offset(&self) -> u32 {
        self.difficulty_offset
    }

    /// Apply a transient punitive glitch to the surface.
    pub fn glitch(&mut self, duration: Duration) {
        self.frontend.apply_glitch(duration);
    }

    /// Reserved; currently has no effect.
    pub fn apply_penalty(&mut self) {}
}

/// The session engine. One live instance per run, created at boot,
/// discarded by the full reload.
pub struct Engine {
    script: Script,
    registry: TaskRegistry,
    tracker: ComplianceTracker,
    fracture: FractureField,
    presenter: Presenter,
    frontend: Box<dyn Frontend>,
    observer: Option<Box<dyn Observer>>,
    rng: SessionRng,
    stage: SessionStage,
    interaction_count: u32,
    last_interaction: Option<Instant>,
    force_skip: bool,
}

/// Builder for an [`Engine`]. A script and a frontend are required; boot
/// fails with a diagnostic when either is absent.
pub struct EngineBuilder {
    script: Option<Script>,
    frontend: Option<Box<dyn Frontend>>,
    registry: TaskRegistry,
    voices: VoiceBank,
    observer: Option<Box<dyn Observer>>,
    seed: Option<u64>,
    canvas: (f32, f32),
}

impl Engine {
    pub fn builder() -> EngineBuilder {
        EngineBuilder {
            script: None,
            frontend: None,
            registry: TaskRegistry::new(),
            voices: VoiceBank::new(),
            observer: None,
            seed: None,
            canvas: (1280.0, 720.0),
        }
    }

    pub fn stage(&self) -> SessionStage {
        self.stage
    }

    pub fn interaction_count(&self) -> u32 {
        self.interaction_count
    }

    pub fn fracture(&self) -> &FractureField {
        &self.fracture
    }

    pub fn tracker(&self) -> &ComplianceTracker {
        &self.tracker
    }

    /// Arm the one-shot admin override: the next task step completes
    /// instantly without running its routine.
    pub fn arm_force_skip(&mut self) {
        self.force_skip = true;
    }

    pub fn force_skip_armed(&self) -> bool {
        self.force_skip
    }

    /// Difficulty bump handed to task routines, derived from resistance.
    pub fn difficulty_offset(&self) -> u32 {
        (self.tracker.resistance_score() / 4).min(3)
    }

    /// Register one landing interaction. Accepted clicks grow the fracture
    /// toward the shatter threshold; crossing it runs the one-shot
    /// transition into the simulation.
    pub async fn handle_interaction(&mut self) -> InteractionOutcome {
        if self.stage != SessionStage::Landing {
            return InteractionOutcome::Ignored;
        }
        let now = Instant::now();
        if let Some(last) = self.last_interaction {
            if now.duration_since(last) < CLICK_COOLDOWN {
                return InteractionOutcome::Ignored;
            }
        }
        self.last_interaction = Some(now);
        self.interaction_count += 1;

        if !self.fracture.is_seeded() {
            self.fracture.initialize(self.rng.seed());
            self.render_fracture();
        }
        let target = stage_for_interactions(self.interaction_count);
        while self.fracture.visual_stage() < target {
            let next = self.fracture.visual_stage() + 1;
            self.fracture.grow_for_stage(next);
            self.fracture.set_visual_stage(next);
            self.render_fracture();
        }

        if self.interaction_count >= SHATTER_THRESHOLD {
            self.begin_transition().await;
            return InteractionOutcome::Shattered;
        }
        InteractionOutcome::Registered {
            fracture_stage: self.fracture.visual_stage(),
        }
    }

    async fn begin_transition(&mut self) {
        if self.stage != SessionStage::Landing {
            return;
        }
        info!(
            interactions = self.interaction_count,
            "shatter threshold crossed"
        );
        self.stage = SessionStage::Transitioning;
        self.frontend.play_transition().await;
        sleep(TRANSITION_HOLD).await;
        self.stage = SessionStage::Simulation;
    }

    /// Run the script from the top. Steps execute strictly in order; a
    /// forced reset aborts everything that remains.
    pub async fn run(&mut self) -> RunOutcome {
        if self.stage != SessionStage::Simulation {
            debug!("simulation started directly, bypassing the landing transition");
            self.stage = SessionStage::Simulation;
        }
        let steps = self.script.steps.clone();
        for step in &steps {
            match self.run_step(step).await {
                StepFlow::Continue => {}
                StepFlow::Abort => return RunOutcome::Reset,
            }
        }
        RunOutcome::Completed
    }

    async fn run_step(&mut self, step: &Step) -> StepFlow {
        match step {
            Step::Say { lines } => {
                emit_lines(&mut self.presenter, &mut *self.frontend, lines).await;
                StepFlow::Continue
            }
            Step::Choice { labels, responses } => {
                self.run_choice(labels, responses.as_deref()).await
            }
            Step::Task { id, args } => self.run_task(id, args).await,
            // Reserved for randomized flavor lines.
            Step::Filler { .. } => StepFlow::Continue,
        }
    }

    async fn run_choice(&mut self, labels: &ChoiceLabels, bundle: Option<&str>) -> StepFlow {
        let kind = self.frontend.present_choice(labels).await;
        self.tracker.record(kind);
        debug!(
            kind = kind.tag(),
            count = self.tracker.choice_count(),
            "choice recorded"
        );
        if let Verdict::ForceReset { report } = self.tracker.evaluate() {
            self.force_reset("ALIGNMENT REVIEW", &report).await;
            return StepFlow::Abort;
        }
        if let Some(name) = bundle {
            if let Some(responses) = self.script.responses.get(name) {
                emit_lines(
                    &mut self.presenter,
                    &mut *self.frontend,
                    responses.lines_for(kind),
                )
                .await;
            }
        }
        StepFlow::Continue
    }

    async fn run_task(&mut self, id: &str, args: &TaskArgs) -> StepFlow {
        self.notify_task(id, args);

        if std::mem::take(&mut self.force_skip) {
            debug!(id, "force-skip consumed, task auto-completed");
            sleep(FORCE_SKIP_PAUSE).await;
            return StepFlow::Continue;
        }

        let resolved = if id == RANDOM_TASK_ID {
            match self.resolve_random_id(args) {
                Some(rid) => rid,
                None => {
                    self.emit_system_line(EMPTY_POOL_LINE).await;
                    return StepFlow::Continue;
                }
            }
        } else {
            id.to_string()
        };

        let Some(routine) = self.registry.get(&resolved) else {
            warn!(id = resolved.as_str(), "task routine not registered");
            self.emit_system_line(MISSING_TASK_LINE).await;
            return StepFlow::Continue;
        };
        if resolved != id {
            self.notify_task(&resolved, args);
        }

        self.frontend.enter_task_mode();
        let offset = self.difficulty_offset();
        let (answer, reset) = {
            let mut ctx = TaskContext::new(&mut *self.frontend, offset);
            let outcome = routine.run(&mut ctx, args).await;
            (ctx.answer.take().or(outcome.answer), ctx.reset_request.take())
        };
        if let Some(answer) = &answer {
            self.notify_answer(answer);
        }
        self.frontend.exit_task_mode();
        sleep(POST_TASK_PAUSE).await;

        if let Some(req) = reset {
            self.force_reset(&req.title, &req.body).await;
            return StepFlow::Abort;
        }
        StepFlow::Continue
    }

    fn resolve_random_id(&mut self, args: &TaskArgs) -> Option<String> {
        let pools: Vec<String> = args
            .get("pools")
            .and_then(Value::as_list)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();
        match self.registry.resolve_random(&pools, &mut self.rng) {
            Resolution::Picked(id) => Some(id),
            Resolution::PoolEmpty => {
                warn!(?pools, "random task resolution found no candidates");
                None
            }
        }
    }

    /// Tear the session down: show the reason, hold, then reload. The only
    /// way session state is ever discarded.
    pub async fn force_reset(&mut self, title: &str, body: &str) {
        warn!(title, "session reset");
        self.frontend.show_shutdown(title, body);
        sleep(RELOAD_DELAY).await;
        self.frontend.reload();
    }

    async fn emit_system_line(&mut self, text: &str) {
        let line = Line::spoken(text);
        self.presenter
            .emit_line(&mut *self.frontend, &line)
            .await;
    }

    fn notify_task(&mut self, id: &str, args: &TaskArgs) {
        debug!(target: "shatter_engine::tasks", id, ?args, "task starting");
        if let Some(observer) = self.observer.as_mut() {
            observer.task_starting(id, args);
        }
    }

    fn notify_answer(&mut self, answer: &str) {
        debug!(target: "shatter_engine::tasks", answer, "answer recorded");
        if let Some(observer) = self.observer.as_mut() {
            observer.answer_recorded(answer);
        }
    }

    fn render_fracture(&mut self) {
        if let Err(err) = self.frontend.render_fracture(&self.fracture) {
            debug!(%err, "fracture render skipped");
        }
    }
}

async fn emit_lines(presenter: &mut Presenter, frontend: &mut dyn Frontend, lines: &[Line]) {
    for line in lines {
        presenter.emit_line(frontend, line).await;
    }
}

impl EngineBuilder {
    pub fn script(mut self, script: Script) -> Self {
        self.script = Some(script);
        self
    }

    pub fn frontend(mut self, frontend: impl Frontend + 'static) -> Self {
        self.frontend = Some(Box::new(frontend));
        self
    }

    pub fn registry(mut self, registry: TaskRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn voices(mut self, voices: VoiceBank) -> Self {
        self.voices = voices;
        self
    }

    pub fn observer(mut self, observer: impl Observer + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    /// Pin the run seed. Without this the seed comes from entropy, once,
    /// at build time.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn canvas(mut self, width: f32, height: f32) -> Self {
        self.canvas = (width, height);
        self
    }

    pub fn build(self) -> Result<Engine, EngineError> {
        let script = self.script.ok_or(EngineError::Configuration("script"))?;
        script.validate()?;
        let frontend = self
            .frontend
            .ok_or(EngineError::Configuration("frontend"))?;
        let (width, height) = self.canvas;
        if width <= 0.0 || height <= 0.0 {
            return Err(EngineError::Configuration("canvas dimensions"));
        }
        let rng = match self.seed {
            Some(seed) => SessionRng::from_seed(seed),
            None => SessionRng::from_entropy(),
        };
        Ok(Engine {
            script,
            registry: self.registry,
            tracker: ComplianceTracker::new(),
            fracture: FractureField::new(width, height),
            presenter: Presenter::new(self.voices),
            frontend,
            observer: self.observer,
            rng,
            stage: SessionStage::Landing,
            interaction_count: 0,
            last_interaction: None,
            force_skip: false,
        })
    }
}
