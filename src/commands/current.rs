// `kbin current`: print the linked version, if any.

use super::Context;

pub fn run(ctx: &Context, tool: &str) -> anyhow::Result<()> {
    ctx.tool(tool)?;
    if let Some(version) = ctx.store.linked_version(tool)? {
        println!("{}", version);
    }
    Ok(())
}
