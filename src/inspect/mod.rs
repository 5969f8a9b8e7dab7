use commands::{Command, Flag, PostAction, States};
use filesys::{HostFilesystem, Nsp, VirtualFilesystem, Xci, vfs};

use crate::pipeline::ContainerKind;

pub fn build(hierarchy: &[String]) -> Command {
    let no_verify = Flag::new(
        None,
        "no-verify",
        "Skip card-image partition hash verification",
        false,
        |states, _| states.set_flag("no_verify"),
    );

    Command::new(
        "inspect",
        vec![String::from("info")],
        "Show container kind and content listing for package files",
        vec![no_verify],
        None,
        run,
        hierarchy,
    )
}

fn run(states: &States, args: Option<&[String]>) -> PostAction {
    let Some(paths) = args else {
        return PostAction::GetHelp;
    };
    let verify = !states.flag("no_verify");

    for path in paths {
        let Some(file) = HostFilesystem.open(path) else {
            println!("{path}: unreadable");
            continue;
        };
        let Some(kind) = ContainerKind::classify(path) else {
            println!("{path}: unsupported container kind");
            continue;
        };
        println!("{path}: {}", kind.as_str());

        let package = match kind {
            ContainerKind::Nca => continue,
            ContainerKind::Xci => match Xci::parse(&file, verify) {
                Ok(xci) => xci.secure_partition_package(vfs::file_stem(file.name())),
                Err(e) => {
                    println!("  cannot parse: {e}");
                    continue;
                }
            },
            ContainerKind::Nsp => match Nsp::parse(&file) {
                Ok(nsp) => Some(nsp),
                Err(e) => {
                    println!("  cannot parse: {e}");
                    continue;
                }
            },
        };
        let Some(package) = package else {
            println!("  no secure partition");
            continue;
        };

        for nca in package.ncas_collapsed() {
            println!("  {}\t{}", nca.content_type().as_str(), nca.name());
        }
    }
    PostAction::Return
}
