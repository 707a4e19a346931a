// `kbin tools`: the registered tool table.

use colored::Colorize;

use kbin::tools::registry;

pub fn run() {
    let width = registry::all()
        .iter()
        .map(|spec| spec.name.len())
        .max()
        .unwrap_or(0);
    for spec in registry::all() {
        println!(
            "  {} {}",
            format!("{:width$}", spec.name, width = width).cyan(),
            spec.about
        );
    }
}
