use commands::{Command, Flag, PostAction, States};
use filesys::HostFilesystem;

use crate::logging::Logger;
use crate::pipeline::resolve_files;

pub fn build(hierarchy: &[String]) -> Command {
    let json = Flag::new(
        Some('j'),
        "json",
        "Print the manifest as JSON",
        false,
        |states, _| states.set_flag("json"),
    );
    let selected = Flag::new(
        Some('s'),
        "selected",
        "Print only the paths left included",
        false,
        |states, _| states.set_flag("selected"),
    );
    let exclude = Flag::new(
        Some('x'),
        "exclude",
        "Toggle the entry for this path off (repeatable)",
        true,
        |states, value| {
            if let Some(path) = value {
                states.push("exclude", path);
            }
        },
    );
    let no_verify = Flag::new(
        None,
        "no-verify",
        "Skip card-image partition hash verification",
        false,
        |states, _| states.set_flag("no_verify"),
    );

    Command::new(
        "resolve",
        vec![String::from("r")],
        "Resolve package files into an install manifest",
        vec![json, selected, exclude, no_verify],
        None,
        run,
        hierarchy,
    )
}

fn run(states: &States, args: Option<&[String]>) -> PostAction {
    let Some(paths) = args else {
        return PostAction::GetHelp;
    };

    let mut settings = match settings::get_settings() {
        Ok(settings) => settings,
        Err(e) => {
            println!("Error: {e}");
            return PostAction::Return;
        }
    };
    if states.flag("no_verify") {
        settings.verify_hashes = false;
    }

    let logger = match Logger::new(&settings) {
        Ok(logger) => logger,
        Err(e) => {
            eprintln!("Warning: {e}");
            Logger::disabled()
        }
    };

    let mut manifest = resolve_files(&HostFilesystem, paths, &settings, &logger);
    for path in states.list("exclude") {
        manifest.toggle(path);
    }

    if states.flag("json") {
        match serde_json::to_string_pretty(&manifest) {
            Ok(json) => println!("{json}"),
            Err(e) => println!("Error: failed to serialize manifest: {e}"),
        }
    } else if states.flag("selected") {
        for path in manifest.selected_paths() {
            println!("{path}");
        }
    } else if manifest.is_empty() {
        println!("No installable files recognized.");
    } else {
        for entry in manifest.entries() {
            let mark = if entry.included { "[x]" } else { "[ ]" };
            println!("{} {}  <- {}", mark, entry.label, entry.path);
        }
    }
    PostAction::Return
}
