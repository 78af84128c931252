#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommandKind {
    Help,
    ReloadConfig,
    ListModels,
    SetModel,
    Reset,
    SaveContext,
    LoadContext,
    NewCharacter,
    DeleteCharacter,
    LoadCharacter,
    ListCharacters,
}

pub struct Command {
    pub name: &'static str,
    /// Argument synopsis shown after the command name, empty when none.
    pub args: &'static str,
    pub help: &'static str,
    pub kind: CommandKind,
}

#[derive(Clone, Copy)]
pub struct CommandInvocation<'a> {
    pub command: &'static Command,
    pub args: &'a str,
}

impl Command {
    /// `!setmodel <model>` style synopsis for the given prefix.
    pub fn synopsis(&self, prefix: char) -> String {
        if self.args.is_empty() {
            format!("{prefix}{}", self.name)
        } else {
            format!("{prefix}{} {}", self.name, self.args)
        }
    }

    pub fn usage(&self, prefix: char) -> String {
        format!("Usage: {}", self.synopsis(prefix))
    }
}

pub fn all_commands() -> &'static [Command] {
    COMMANDS
}

pub fn find_command(name: &str) -> Option<&'static Command> {
    all_commands()
        .iter()
        .find(|command| command.name.eq_ignore_ascii_case(name))
}

const COMMANDS: &[Command] = &[
    Command {
        name: "help",
        args: "",
        help: "Display this help message.",
        kind: CommandKind::Help,
    },
    Command {
        name: "reloadconfig",
        args: "",
        help: "Reloads bot settings from the config file.",
        kind: CommandKind::ReloadConfig,
    },
    Command {
        name: "listmodels",
        args: "",
        help: "Show all supported models.",
        kind: CommandKind::ListModels,
    },
    Command {
        name: "setmodel",
        args: "<model>",
        help: "Switch the current channel's model.",
        kind: CommandKind::SetModel,
    },
    Command {
        name: "reset",
        args: "",
        help: "Clear the current conversation history.",
        kind: CommandKind::Reset,
    },
    Command {
        name: "savecontext",
        args: "<name>",
        help: "Save this channel's conversation (plus active model) under `<name>`.",
        kind: CommandKind::SaveContext,
    },
    Command {
        name: "loadcontext",
        args: "<name>",
        help: "Restore a previously saved conversation named `<name>`.",
        kind: CommandKind::LoadContext,
    },
    Command {
        name: "newcharacter",
        args: "<name> <model> <prompt>",
        help: "Create a new character using `<model>` and initial character `<prompt>`.",
        kind: CommandKind::NewCharacter,
    },
    Command {
        name: "deletecharacter",
        args: "<name>",
        help: "Remove the character `<name>` from the character list.",
        kind: CommandKind::DeleteCharacter,
    },
    Command {
        name: "loadcharacter",
        args: "<name>",
        help: "Reset chat and load the character `<name>` (initial character prompt + model).",
        kind: CommandKind::LoadCharacter,
    },
    Command {
        name: "listcharacters",
        args: "",
        help: "List all saved characters and their models.",
        kind: CommandKind::ListCharacters,
    },
];
