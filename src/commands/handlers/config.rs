use crate::commands::{CommandContext, HandlerResult};

pub(crate) async fn handle_reload_config(cx: &CommandContext<'_>) -> HandlerResult {
    match cx.relay.config.reload() {
        Ok(_) => cx.reply("Configuration reloaded successfully!").await,
        Err(err) => cx.reply(format!("Failed to reload config: {err}")).await,
    }
}

pub(crate) async fn handle_list_models(cx: &CommandContext<'_>) -> HandlerResult {
    let model_list = cx.config.supported_models.join("\n");
    cx.reply(format!("**Available models:**\n{model_list}")).await
}

pub(crate) async fn handle_set_model(cx: &CommandContext<'_>) -> HandlerResult {
    let model = cx.args;
    if model.is_empty() {
        return cx.usage().await;
    }

    if !cx.config.supports_model(model) {
        return cx
            .reply(unsupported_model_message(model, cx.prefix()))
            .await;
    }

    cx.with_session(|session| session.set_model(model)).await;
    cx.reply(format!("Model set to: **{model}**")).await
}

pub(crate) fn unsupported_model_message(model: &str, prefix: char) -> String {
    format!("Model '{model}' not supported. Use {prefix}listmodels for available options.")
}
