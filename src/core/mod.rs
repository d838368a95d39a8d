//! Core reloading types.

mod builder;
mod fingerprint;
mod format;
mod reloader;
mod source;
mod typed;

pub use builder::ReloaderBuilder;
pub use fingerprint::Fingerprint;
pub use format::{ConfigFormat, decode};
pub use reloader::Reloader;
pub use source::{ReloadSource, ReloadingOptions};
pub use typed::{TypedReloader, TypedReloadingOptions};
