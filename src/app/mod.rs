// Application layer: the concrete sources wired into the CLI.

pub mod sources;
