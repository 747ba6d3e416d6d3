/// Preview — headless scripted run of a content file.
///
/// Usage: preview <script.ron> [--voices <voices.ron>] [--seed <n>]
///
/// Registers a stub routine for every scripted task id so the run never
/// stalls on missing content, cycles canned choices, and prints the
/// transcript to stdout. Timing is real: lines reveal at play speed.
use async_trait::async_trait;
use std::path::Path;
use std::process;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use shatter_engine::core::console::ConsoleFrontend;
use shatter_engine::core::presenter::VoiceBank;
use shatter_engine::core::registry::{TaskRegistry, TaskRoutine};
use shatter_engine::core::sequencer::{Engine, TaskContext};
use shatter_engine::schema::script::{ChoiceKind, Script, Step};
use shatter_engine::schema::task::{TaskArgs, TaskOutcome};

struct StubRoutine {
    id: String,
}

#[async_trait]
impl TaskRoutine for StubRoutine {
    async fn run(&self, ctx: &mut TaskContext<'_>, _args: &TaskArgs) -> TaskOutcome {
        ctx.open(&self.id, "stub procedure, auto-completing");
        tokio::time::sleep(Duration::from_millis(300)).await;
        TaskOutcome::empty()
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        println!("Usage: preview <script.ron> [--voices <voices.ron>] [--seed <n>]");
        process::exit(0);
    }

    let script_path = &args[1];
    let mut voices_path = None;
    let mut seed = None;

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--voices" if i + 1 < args.len() => {
                i += 1;
                voices_path = Some(args[i].clone());
            }
            "--seed" if i + 1 < args.len() => {
                i += 1;
                seed = args[i].parse::<u64>().ok();
            }
            _ => {}
        }
        i += 1;
    }

    let script = match Script::load_from_ron(Path::new(script_path)) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("ERROR: Failed to load script: {}", e);
            process::exit(1);
        }
    };

    let voices = match voices_path {
        Some(path) => match VoiceBank::load_from_ron(Path::new(&path)) {
            Ok(bank) => bank,
            Err(e) => {
                eprintln!("ERROR: Failed to load voice bank: {}", e);
                process::exit(1);
            }
        },
        None => VoiceBank::new(),
    };

    let mut registry = TaskRegistry::new();
    for step in &script.steps {
        if let Step::Task { id, .. } = step {
            if id != "random" {
                registry.register_one(id.clone(), Arc::new(StubRoutine { id: id.clone() }));
            }
        }
    }

    let frontend = ConsoleFrontend::rotating(vec![
        ChoiceKind::Lie,
        ChoiceKind::Run,
        ChoiceKind::Comply,
    ]);

    let mut builder = Engine::builder()
        .script(script)
        .frontend(frontend)
        .registry(registry)
        .voices(voices);
    if let Some(seed) = seed {
        builder = builder.seed(seed);
    }

    let mut engine = match builder.build() {
        Ok(e) => e,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            process::exit(1);
        }
    };

    let outcome = engine.run().await;
    println!("\n(run finished: {:?})", outcome);
}
