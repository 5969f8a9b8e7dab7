use std::{collections::HashMap, slice::Iter};

// The action to perform once a command has run
pub enum PostAction {
    GetHelp,
    Return,
}

/// Typed store the flags of one command write into before its run
/// function executes.
#[derive(Debug, Default)]
pub struct States {
    store: HashMap<String, Value>,
}

#[derive(Clone, Debug)]
enum Value {
    Flag(bool),
    Text(String),
    List(Vec<String>),
}

impl States {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_flag(&mut self, key: &str) {
        self.store.insert(key.to_string(), Value::Flag(true));
    }

    pub fn flag(&self, key: &str) -> bool {
        matches!(self.store.get(key), Some(Value::Flag(true)))
    }

    pub fn set_text(&mut self, key: &str, value: &str) {
        self.store
            .insert(key.to_string(), Value::Text(value.to_string()));
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        match self.store.get(key) {
            Some(Value::Text(value)) => Some(value),
            _ => None,
        }
    }

    pub fn push(&mut self, key: &str, value: &str) {
        let entry = self
            .store
            .entry(key.to_string())
            .or_insert_with(|| Value::List(Vec::new()));
        if let Value::List(values) = entry {
            values.push(value.to_string());
        }
    }

    pub fn list(&self, key: &str) -> &[String] {
        match self.store.get(key) {
            Some(Value::List(values)) => values,
            _ => &[],
        }
    }
}

pub struct Flag {
    pub short: Option<char>,
    pub long: String,
    pub about: String,
    /// Whether the flag consumes the following argument as its value.
    pub consumer: bool,
    pub run_func: fn(states: &mut States, value: Option<&String>),
}

impl Flag {
    pub fn new(
        short: Option<char>,
        long: &str,
        about: &str,
        consumer: bool,
        run_func: fn(states: &mut States, value: Option<&String>),
    ) -> Self {
        Flag {
            short,
            long: long.to_string(),
            about: about.to_string(),
            consumer,
            run_func,
        }
    }

    pub fn help(&self) -> String {
        match self.short {
            Some(short) => format!("-{}, --{}\t{}", short, self.long, self.about),
            None => format!("    --{}\t{}", self.long, self.about),
        }
    }
}

// Extraction of complex type
type SubcommandBuilders = Option<Vec<fn(parents: &[String]) -> Command>>;

pub struct Command {
    pub name: String,
    pub aliases: Vec<String>,
    pub about: String,
    pub flags: Vec<Flag>,
    pub subcommands: SubcommandBuilders,
    states: States,
    pub run_func: fn(states: &States, args: Option<&[String]>) -> PostAction,
    pub hierarchy: Vec<String>,
}

impl Command {
    pub fn new(
        name: &str,
        aliases: Vec<String>,
        about: &str,
        flags: Vec<Flag>,
        subcommands: SubcommandBuilders,
        run_func: fn(states: &States, args: Option<&[String]>) -> PostAction,
        hierarchy: &[String],
    ) -> Self {
        Command {
            name: name.to_string(),
            aliases,
            about: about.to_string(),
            flags,
            subcommands,
            states: States::new(),
            run_func,
            hierarchy: hierarchy.to_vec(),
        }
    }

    // Hierarchy including this command, for subcommand help tips.
    fn lineage(&self) -> Vec<String> {
        let mut lineage = self.hierarchy.clone();
        lineage.push(self.name.clone());
        lineage
    }

    pub fn help(&self) -> String {
        let mut help = format!("{}\n", self.about);

        let mut usage = format!("Usage:\n  {} [flags]\n", self.name);
        let mut commands = String::new();
        if let Some(builders) = &self.subcommands
            && !builders.is_empty()
        {
            usage.push_str(&format!("  {} [command]\n", self.name));
            commands.push_str("\nAvailable Commands:\n");
            for build in builders {
                let command = build(&[]);
                commands.push_str(&format!("  {}\t{}\n", command.name, command.about));
            }
        }

        let mut aliases = String::new();
        if !self.aliases.is_empty() {
            aliases.push_str(&format!("\nAliases:\n  {}, {}\n", self.name, self.aliases.join(", ")));
        }

        let mut flags = String::from("\nFlags:\n");
        for flag in &self.flags {
            flags.push_str(&format!("  {}\n", flag.help()));
        }
        flags.push_str(&format!("  -h, --help\thelp for {}", self.name));

        help.push_str(&format!("{usage}{commands}{aliases}{flags}"));
        if self.subcommands.is_some() {
            help.push_str(&format!(
                "\n\nUse `{} [command] --help` for more information about a command.",
                self.lineage().join(" ")
            ));
        }
        help
    }

    // Run the command: parse flags, dispatch the first bare argument as a
    // subcommand when one matches, pass the rest to the run function.
    pub fn run(self, mut args: Iter<'_, String>) {
        let mut m_self = self;
        let mut positionals: Vec<String> = Vec::new();

        while let Some(arg) = args.next() {
            if let Some(long) = arg.strip_prefix("--") {
                if long == "help" {
                    println!("{}", m_self.help());
                    return;
                }
                let Some(index) = m_self.flags.iter().position(|flag| flag.long == long) else {
                    let error = format!("unknown flag: '--{long}'");
                    println!("Error: {error}\n{}", m_self.help());
                    return;
                };
                let value = if m_self.flags[index].consumer {
                    args.next().cloned()
                } else {
                    None
                };
                (m_self.flags[index].run_func)(&mut m_self.states, value.as_ref());
            } else if let Some(shorts) = arg.strip_prefix('-') {
                for short in shorts.chars() {
                    if short == 'h' {
                        println!("{}", m_self.help());
                        return;
                    }
                    let Some(index) =
                        m_self.flags.iter().position(|flag| flag.short == Some(short))
                    else {
                        let error = format!("unknown shorthand flag: '{short}' in -{shorts}");
                        println!("Error: {error}\n{}", m_self.help());
                        return;
                    };
                    let value = if m_self.flags[index].consumer {
                        args.next().cloned()
                    } else {
                        None
                    };
                    (m_self.flags[index].run_func)(&mut m_self.states, value.as_ref());
                }
            } else if positionals.is_empty() && m_self.subcommands.is_some() {
                m_self.dispatch(arg, args);
                return;
            } else {
                positionals.push(arg.clone());
            }
        }

        let args = if positionals.is_empty() {
            None
        } else {
            Some(positionals.as_slice())
        };
        match (m_self.run_func)(&m_self.states, args) {
            PostAction::GetHelp => println!("{}", m_self.help()),
            PostAction::Return => (),
        }
    }

    fn dispatch(self, arg: &str, args: Iter<'_, String>) {
        let parents = self.lineage();
        if let Some(builders) = self.subcommands {
            for build in builders {
                let command = build(&parents);
                if command.name == arg || command.aliases.iter().any(|alias| alias == arg) {
                    command.run(args.clone());
                    return;
                }
            }
        }
        println!(
            "Error: unknown command \"{arg}\" for \"{}\"\nRun {} --help for usage.",
            self.name, self.name
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn states_store_flags_text_and_lists() {
        let mut states = States::new();
        assert!(!states.flag("json"));
        states.set_flag("json");
        assert!(states.flag("json"));

        states.set_text("name", "value");
        assert_eq!(states.text("name"), Some("value"));
        assert_eq!(states.text("missing"), None);

        states.push("exclude", "a");
        states.push("exclude", "b");
        assert_eq!(states.list("exclude"), &["a", "b"]);
        assert!(states.list("missing").is_empty());
    }

    #[test]
    fn help_lists_flags_and_subcommands() {
        fn sub(parents: &[String]) -> Command {
            Command::new(
                "resolve",
                vec![String::from("r")],
                "Resolve things",
                Vec::new(),
                None,
                |_, _| PostAction::Return,
                parents,
            )
        }
        let command = Command::new(
            "tool",
            Vec::new(),
            "A tool.",
            vec![Flag::new(Some('j'), "json", "JSON output", false, |s, _| {
                s.set_flag("json")
            })],
            Some(vec![sub]),
            |_, _| PostAction::GetHelp,
            &[],
        );
        let help = command.help();
        assert!(help.contains("resolve"));
        assert!(help.contains("--json"));
        assert!(help.contains("-h, --help"));
    }
}
