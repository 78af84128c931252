use super::config::unsupported_model_message;
use crate::commands::{split_first_word, CommandContext, HandlerResult};
use crate::storage::Character;

pub(crate) async fn handle_new_character(cx: &CommandContext<'_>) -> HandlerResult {
    let (name, rest) = split_first_word(cx.args);
    let (model, prompt) = split_first_word(rest);
    if name.is_empty() || model.is_empty() || prompt.is_empty() {
        return cx.usage().await;
    }

    if !cx.config.supports_model(model) {
        return cx
            .reply(unsupported_model_message(model, cx.prefix()))
            .await;
    }

    let character = Character {
        name: name.to_string(),
        model: model.to_string(),
        prompt: prompt.to_string(),
        error_override: None,
    };
    match cx.relay.characters.upsert(character) {
        Ok(()) => cx.reply(format!("Character '{name}' created.")).await,
        Err(err) => cx.reply(format!("Error saving character: {err}")).await,
    }
}

pub(crate) async fn handle_delete_character(cx: &CommandContext<'_>) -> HandlerResult {
    let name = cx.args;
    if name.is_empty() {
        return cx.usage().await;
    }

    match cx.relay.characters.remove(name) {
        Ok(true) => cx.reply(format!("Character '{name}' deleted.")).await,
        Ok(false) => cx.reply(format!("Character '{name}' not found.")).await,
        Err(err) => cx.reply(format!("Error deleting character: {err}")).await,
    }
}

pub(crate) async fn handle_load_character(cx: &CommandContext<'_>) -> HandlerResult {
    let name = cx.args;
    if name.is_empty() {
        return cx.usage().await;
    }

    let character = match cx.relay.characters.get(name) {
        Ok(Some(character)) => character,
        Ok(None) => return cx.reply(format!("Character '{name}' not found.")).await,
        Err(err) => return cx.reply(format!("Error loading character: {err}")).await,
    };

    cx.with_session(|session| {
        session.load_character(&character.name, &character.model, &character.prompt)
    })
    .await;
    cx.reply(format!(
        "Character '{name}' loaded. Chat reset with system prompt."
    ))
    .await
}

pub(crate) async fn handle_list_characters(cx: &CommandContext<'_>) -> HandlerResult {
    let characters = match cx.relay.characters.list() {
        Ok(characters) => characters,
        Err(err) => return cx.reply(format!("Error reading characters: {err}")).await,
    };

    if characters.is_empty() {
        return cx.reply("No characters available.").await;
    }

    let lines: Vec<String> = characters
        .iter()
        .map(|character| format!("{}: {}", character.name, character.model))
        .collect();
    cx.reply(format!("**Available Characters:**\n{}", lines.join("\n")))
        .await
}
