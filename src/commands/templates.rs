use anyhow::{Result, bail};
use colored::Colorize;
use serde::Serialize;

use crate::cli::context::RunContext;
use crate::models::{CustomHostRequestTemplates, CustomMessageTemplates, Language, MessageRole, MessageType};
use crate::output::format::OutputMode;
use crate::output::json::to_json;
use crate::store::Store;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TemplatesJson<'a> {
    custom_message_templates: &'a CustomMessageTemplates,
    custom_host_request_templates: &'a CustomHostRequestTemplates,
}

fn preview(text: &str) -> String {
    let first_line = text.lines().next().unwrap_or("");
    let mut short: String = first_line.chars().take(60).collect();
    if short.len() < first_line.len() || text.lines().nth(1).is_some() {
        short.push('…');
    }
    short
}

pub fn list(store: &Store, ctx: &RunContext) -> Result<()> {
    let messages = store.custom_templates();
    let host_requests = store.host_request_templates();

    match ctx.output_mode {
        OutputMode::Json => {
            println!(
                "{}",
                to_json(&TemplatesJson {
                    custom_message_templates: messages,
                    custom_host_request_templates: host_requests,
                })
            );
        }
        OutputMode::Tty => {
            if messages.is_empty() && host_requests.is_empty() {
                println!("No custom templates. The built-in texts are used.");
                return Ok(());
            }
            for (language, by_type) in messages {
                for (message, by_role) in by_type {
                    for (role, text) in by_role {
                        println!(
                            "{} {} {} {}",
                            language.to_string().bold(),
                            message.as_str().cyan(),
                            role.to_string().dimmed(),
                            preview(text)
                        );
                    }
                }
            }
            for (language, text) in host_requests {
                println!(
                    "{} {} {}",
                    language.to_string().bold(),
                    "host-request".cyan(),
                    preview(text)
                );
            }
        }
    }
    Ok(())
}

pub fn set(
    store: &mut Store,
    language: Language,
    message: MessageType,
    role: MessageRole,
    text: &str,
    ctx: &RunContext,
) -> Result<()> {
    if text.trim().is_empty() {
        bail!("Template text is empty; use `kbv templates reset` to go back to the built-in text");
    }
    let verb = match store.custom_template(language, message, role) {
        Some(_) => "Replaced",
        None => "Saved",
    };
    store.save_custom_template(language, message, role, text)?;
    if ctx.output_mode == OutputMode::Tty {
        println!("{} {} {} {} template for the {}", "✓".green(), verb, language, message, role);
    }
    Ok(())
}

pub fn reset(store: &mut Store, language: Language, message: MessageType, role: MessageRole, ctx: &RunContext) -> Result<()> {
    store.delete_custom_template(language, message, role)?;
    if ctx.output_mode == OutputMode::Tty {
        println!("{} Restored the built-in {} {} template for the {}", "✓".green(), language, message, role);
    }
    Ok(())
}

pub fn host_request_set(store: &mut Store, language: Language, text: &str, ctx: &RunContext) -> Result<()> {
    if text.trim().is_empty() {
        bail!("Template text is empty; use `kbv templates host-request-reset` instead");
    }
    store.save_custom_host_request_template(language, text)?;
    if ctx.output_mode == OutputMode::Tty {
        println!("{} Saved the {} host-request template", "✓".green(), language);
    }
    Ok(())
}

pub fn host_request_reset(store: &mut Store, language: Language, ctx: &RunContext) -> Result<()> {
    store.delete_custom_host_request_template(language)?;
    if ctx.output_mode == OutputMode::Tty {
        println!("{} Restored the built-in {} host-request template", "✓".green(), language);
    }
    Ok(())
}
