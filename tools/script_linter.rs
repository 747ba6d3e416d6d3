/// Script Linter — validates a script document's internal references.
///
/// Usage: script_linter <script.ron> [--tasks <manifest.ron>]
///
/// The optional manifest is a RON list of task ids known to the content
/// packs; with it, scripted task steps can be checked against reality.
use shatter_engine::schema::script::{Script, Step};
use std::collections::HashSet;
use std::path::Path;
use std::process;

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        println!("Usage: script_linter <script.ron> [--tasks <manifest.ron>]");
        process::exit(0);
    }

    let script_path = &args[1];
    let mut tasks_path = None;

    let mut i = 2;
    while i < args.len() {
        if args[i] == "--tasks" && i + 1 < args.len() {
            i += 1;
            tasks_path = Some(args[i].clone());
        }
        i += 1;
    }

    let contents = match std::fs::read_to_string(Path::new(script_path)) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("ERROR: Failed to read '{}': {}", script_path, e);
            process::exit(1);
        }
    };
    let script = match Script::parse_ron(&contents) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("ERROR: Failed to parse script: {}", e);
            process::exit(1);
        }
    };

    println!(
        "Loaded script: {} steps, {} response bundles, {} filler pools",
        script.steps.len(),
        script.responses.len(),
        script.fillers.len()
    );

    let known_tasks: Option<HashSet<String>> = tasks_path.map(|path| load_task_manifest(&path));

    let (errors, warnings) = lint_script(&script, known_tasks.as_ref());

    println!("\n=== Script Lint Report ===\n");

    if errors.is_empty() && warnings.is_empty() {
        println!("All checks passed!");
    }

    for warning in &warnings {
        println!("WARNING: {}", warning);
    }

    for error in &errors {
        println!("ERROR: {}", error);
    }

    println!(
        "\nSummary: {} errors, {} warnings",
        errors.len(),
        warnings.len()
    );

    if errors.is_empty() {
        process::exit(0);
    } else {
        process::exit(1);
    }
}

fn load_task_manifest(path: &str) -> HashSet<String> {
    let contents = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("ERROR: Failed to read task manifest '{}': {}", path, e);
            process::exit(1);
        }
    };
    let ids: Vec<String> = match ron::from_str(&contents) {
        Ok(ids) => ids,
        Err(e) => {
            eprintln!("ERROR: Failed to parse task manifest: {}", e);
            process::exit(1);
        }
    };
    ids.into_iter().collect()
}

fn lint_script(
    script: &Script,
    known_tasks: Option<&HashSet<String>>,
) -> (Vec<String>, Vec<String>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    let mut used_bundles = HashSet::new();
    let mut used_pools = HashSet::new();

    for (idx, step) in script.steps.iter().enumerate() {
        match step {
            Step::Say { lines } => {
                if lines.is_empty() {
                    warnings.push(format!("step {}: Say step has no lines", idx));
                }
            }
            Step::Choice { responses, .. } => {
                if let Some(name) = responses {
                    used_bundles.insert(name.clone());
                    if !script.responses.contains_key(name) {
                        errors.push(format!(
                            "step {}: references non-existent response bundle '{}'",
                            idx, name
                        ));
                    }
                }
            }
            Step::Task { id, args } => {
                if id == "random" {
                    if !args.contains_key("pools") {
                        warnings.push(format!(
                            "step {}: random task has no 'pools' argument, \
                             selection will fall back to the full registry",
                            idx
                        ));
                    }
                } else if let Some(known) = known_tasks {
                    if !known.contains(id) {
                        errors.push(format!(
                            "step {}: task id '{}' is not in the manifest",
                            idx, id
                        ));
                    }
                }
            }
            Step::Filler { pool } => {
                used_pools.insert(pool.clone());
                if !script.fillers.contains_key(pool) {
                    errors.push(format!(
                        "step {}: references non-existent filler pool '{}'",
                        idx, pool
                    ));
                }
            }
        }
    }

    for name in script.responses.keys() {
        if !used_bundles.contains(name) {
            warnings.push(format!("response bundle '{}' is never referenced", name));
        }
    }
    for name in script.fillers.keys() {
        if !used_pools.contains(name) {
            warnings.push(format!("filler pool '{}' is never referenced", name));
        }
    }

    (errors, warnings)
}
