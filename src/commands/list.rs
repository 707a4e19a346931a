// `kbin list`: remote catalog, or local installs with --installed.

use kbin::tools::ToolDescriptor;

use super::Context;

pub fn run(ctx: &Context, tool: &str, installed: bool) -> anyhow::Result<()> {
    let descriptor = ctx.tool(tool)?;

    if !installed {
        for version in descriptor.versions(ctx.settings.max_versions)? {
            println!("{}", version);
        }
        return Ok(());
    }

    let current = ctx.store.linked_version(tool)?;
    for version in ctx.store.list_installed(tool)? {
        let marker = if current.as_deref() == Some(version.as_str()) {
            "*"
        } else {
            " "
        };
        println!("{} {}", marker, version);
    }
    Ok(())
}
