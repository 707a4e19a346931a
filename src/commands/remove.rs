// `kbin rm`: remove installed versions, or purge a tool.

use colored::Colorize;

use kbin::log_info;
use kbin::tools::ToolDescriptor;

use super::Context;

pub fn run(ctx: &Context, tool: &str, versions: &[String], purge: bool) -> anyhow::Result<()> {
    let descriptor = ctx.tool(tool)?;

    if purge {
        ctx.store.purge(tool)?;
        log_info!("[kbin::rm] purged {}", tool.cyan());
        return Ok(());
    }

    let versions: Vec<String> = versions
        .iter()
        .map(|v| descriptor.normalize_version(v))
        .collect();
    ctx.store.remove_versions(tool, &versions)?;
    log_info!(
        "[kbin::rm] removed {} {}",
        tool.cyan(),
        versions.join(", ").magenta()
    );
    Ok(())
}
