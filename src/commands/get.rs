// `kbin get`: install a version and make it current.

use colored::Colorize;

use kbin::fetchers;
use kbin::libs::tool_installer::Installer;
use kbin::log_info;

use super::Context;

pub fn run(ctx: &Context, tool: &str, version: &str, force: bool) -> anyhow::Result<()> {
    let descriptor = ctx.tool(tool)?;
    let fetcher = fetchers::pipeline(ctx.settings.retries, ctx.settings.timeout)?;
    let installer = Installer::new(&ctx.store, &*fetcher, ctx.settings.max_versions);

    log_info!(
        "[kbin::get] installing {} {} for {}",
        tool.cyan(),
        version.magenta(),
        ctx.platform.to_string().bright_blue()
    );
    let payload = installer.install(&descriptor, version, force)?;
    println!("binary installed at path {}", payload.display());
    Ok(())
}
