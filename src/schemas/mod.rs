// Data shapes: GitHub API payloads and the static tool description table.
pub mod release;
pub mod tools;
