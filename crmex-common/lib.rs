pub use self::backoff::ResettableBackoff;

pub mod logging;
pub mod tasks;

mod backoff;
