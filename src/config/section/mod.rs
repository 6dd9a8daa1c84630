//! Configuration sections of `folio.toml`.

mod compile;
mod preview;
mod save;

pub use compile::CompileConfig;
pub use preview::PreviewConfig;
pub use save::SaveConfig;
