//! Shipped-content integration tests: the script and voice bank under
//! content/ must load, validate, and agree with each other.

use shatter_engine::core::presenter::VoiceBank;
use shatter_engine::schema::script::{Script, Step};
use std::collections::HashSet;
use std::path::Path;

fn load_shipped_script() -> Script {
    Script::load_from_ron(Path::new("content/simulation.ron")).unwrap()
}

fn load_shipped_voices() -> VoiceBank {
    VoiceBank::load_from_ron(Path::new("content/voices.ron")).unwrap()
}

#[test]
fn shipped_script_loads_and_validates() {
    let script = load_shipped_script();
    assert!(!script.steps.is_empty());
    script.validate().unwrap();
}

#[test]
fn shipped_script_covers_every_step_kind() {
    let script = load_shipped_script();
    let mut kinds = HashSet::new();
    for step in &script.steps {
        kinds.insert(match step {
            Step::Say { .. } => "say",
            Step::Choice { .. } => "choice",
            Step::Task { .. } => "task",
            Step::Filler { .. } => "filler",
        });
    }
    assert_eq!(kinds.len(), 4);
}

#[test]
fn shipped_voice_references_resolve() {
    let script = load_shipped_script();
    let voices = load_shipped_voices();

    let mut check = |voice: &Option<String>| {
        if let Some(id) = voice {
            assert!(
                voices.duration_ms(id).is_some(),
                "voice id '{}' missing from voices.ron",
                id
            );
        }
    };

    for step in &script.steps {
        if let Step::Say { lines } = step {
            for line in lines {
                check(&line.voice);
            }
        }
    }
    for bundle in script.responses.values() {
        for line in bundle
            .comply
            .iter()
            .chain(bundle.lie.iter())
            .chain(bundle.run.iter())
        {
            check(&line.voice);
        }
    }
    for lines in script.fillers.values() {
        for line in lines {
            check(&line.voice);
        }
    }
}

#[test]
fn shipped_random_step_names_pools() {
    let script = load_shipped_script();
    let random_step = script
        .steps
        .iter()
        .find_map(|step| match step {
            Step::Task { id, args } if id == "random" => Some(args),
            _ => None,
        })
        .expect("shipped script should exercise the random task");
    let pools = random_step
        .get("pools")
        .and_then(|v| v.as_list())
        .expect("random step should carry a pools list");
    assert!(!pools.is_empty());
}

#[test]
fn shipped_voice_bank_has_durations() {
    let voices = load_shipped_voices();
    assert!(!voices.is_empty());
    assert_eq!(voices.duration_ms("sim_intro_01"), Some(2_400));
    assert_eq!(voices.duration_ms("nonexistent"), None);
}

#[test]
fn malformed_script_is_rejected() {
    assert!(Script::parse_ron("Script(steps: [NotAStep()])").is_err());
    assert!(Script::parse_ron("").is_err());
}
