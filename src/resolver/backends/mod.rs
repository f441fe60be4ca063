// Resolver backends

pub mod cli;
pub mod metadata;

pub use cli::CliResolver;
pub use metadata::{MetadataResolver, WatchPageSource};
