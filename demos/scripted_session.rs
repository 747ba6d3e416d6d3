//! Minimal end-to-end session: a three-step inline script, one registered
//! task routine, and the console frontend with canned choices.
//!
//! Run with: cargo run --example scripted_session

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use shatter_engine::core::console::ConsoleFrontend;
use shatter_engine::core::registry::{TaskRegistry, TaskRoutine};
use shatter_engine::core::sequencer::{Engine, TaskContext};
use shatter_engine::schema::script::{ChoiceKind, ChoiceLabels, Line, ResponseBundle, Script, Step};
use shatter_engine::schema::task::{TaskArgs, TaskOutcome};

struct Keypad;

#[async_trait]
impl TaskRoutine for Keypad {
    async fn run(&self, ctx: &mut TaskContext<'_>, args: &TaskArgs) -> TaskOutcome {
        let digits = args
            .get("digits")
            .and_then(|v| v.as_int())
            .unwrap_or(4);
        ctx.open("KEYPAD", "enter the access code");
        // A real challenge would wait on player input; this one types for you.
        tokio::time::sleep(Duration::from_millis(400)).await;
        let code: String = "1893".chars().take(digits as usize).collect();
        ctx.set_answer(code.clone());
        TaskOutcome::answered(code)
    }
}

#[tokio::main]
async fn main() {
    let script = Script {
        steps: vec![
            Step::Say {
                lines: vec![
                    Line::spoken("You should not have done that."),
                    Line::spoken("Calibration first."),
                ],
            },
            Step::Task {
                id: "keypad_4".to_string(),
                args: [("digits".to_string(), shatter_engine::schema::task::Value::Int(4))]
                    .into_iter()
                    .collect(),
            },
            Step::Choice {
                labels: ChoiceLabels {
                    comply: "I will cooperate.".to_string(),
                    lie: "That was not me.".to_string(),
                    run: "Let me out.".to_string(),
                },
                responses: Some("first_contact".to_string()),
            },
            Step::Say {
                lines: vec![Line::spoken("The pane will be replaced by morning.")],
            },
        ],
        responses: [(
            "first_contact".to_string(),
            ResponseBundle {
                comply: vec![Line::spoken("Good. Stay that way.")],
                lie: vec![Line::spoken("We both watched you do it.")],
                run: vec![Line::spoken("There is no door in here.")],
            },
        )]
        .into_iter()
        .collect(),
        ..Script::default()
    };

    let mut registry = TaskRegistry::new();
    registry.register_one("keypad_4", Arc::new(Keypad));

    let mut engine = Engine::builder()
        .script(script)
        .frontend(ConsoleFrontend::rotating(vec![ChoiceKind::Run]))
        .registry(registry)
        .seed(42)
        .build()
        .expect("engine configuration");

    let outcome = engine.run().await;
    println!("\n(run finished: {:?})", outcome);
}
