use std::{env, path::Path};

use nandin::{inspect, resolve};

fn main() {
    let args: Vec<String> = env::args().collect();
    let mut args = args.iter();
    let name = args
        .next()
        .map(|arg| Path::new(arg).file_name().map(|x| x.to_str()))
        .unwrap_or(None)
        .unwrap_or(None)
        .unwrap_or("nandin");
    // Main command
    let main_command = commands::Command::new(
        name,
        Vec::new(),
        "NANDIN resolves Nintendo Switch package files into an installable file manifest.",
        vec![],
        Some(vec![inspect::build, resolve::build]),
        |_states, _args| commands::PostAction::GetHelp,
        &[],
    );
    // Run the command with the provided arguments
    main_command.run(args);
}
