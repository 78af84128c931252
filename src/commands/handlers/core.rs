use crate::commands::{all_commands, CommandContext, HandlerResult};

/// Usage text listing every registered command with the active prefix.
pub(crate) fn help_text(prefix: char) -> String {
    let mut help = String::from("**Available Commands**\n");
    for command in all_commands() {
        help.push_str(&format!(
            "• `{}`\n  {}\n\n",
            command.synopsis(prefix),
            command.help
        ));
    }
    help.trim_end().to_string()
}

pub(crate) async fn handle_help(cx: &CommandContext<'_>) -> HandlerResult {
    cx.reply(help_text(cx.prefix())).await
}
