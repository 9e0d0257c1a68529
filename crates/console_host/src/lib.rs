//! Console host: the glue a rendering shell embeds. Owns the engine, maps
//! core effects to engine commands and engine events back to core messages.
mod effects;
pub mod logging;
mod session;

pub use effects::EffectRunner;
pub use session::ConsoleSession;
