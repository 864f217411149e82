//! `radv chat`: ask the advisor in plain words

use advisor_lib::ChatData;
use anyhow::Result;
use colored::Colorize;

use super::{analyze, usage, Backend};
use crate::output::{print_json, OutputFormat};

pub async fn chat(backend: &Backend, message: &str, format: OutputFormat) -> Result<()> {
    let reply = backend.chat(message).await?;

    if format == OutputFormat::Json {
        return print_json(&reply);
    }

    println!("{}", reply.response.cyan());
    match &reply.data {
        Some(ChatData::Usage(report)) => usage::render(report, None, &backend.policy(), format)?,
        Some(ChatData::Analysis(report)) => analyze::render(report, format)?,
        None => {}
    }

    Ok(())
}
