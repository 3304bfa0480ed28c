pub mod errors;

pub use errors::{CopyError, LockError, PaletteError, ProcessError, ResolveError, WatchError};
