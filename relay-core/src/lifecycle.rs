//! Optional lifecycle hooks for extension instances.

use crate::error::BoxError;

/// Initialize/destroy hooks an implementation may expose.
///
/// The registry calls `initialize` once on the final (outermost, after
/// decoration) instance of each named construction, and `destroy` once per
/// raw instance during host shutdown. Decorated instances are destroyed
/// through their raw inner instance, not through the decorator chain.
pub trait Lifecycle: Send + Sync {
    /// Called once after the instance is fully constructed and decorated.
    fn initialize(&self) -> Result<(), BoxError> {
        Ok(())
    }

    /// Called once during host shutdown.
    fn destroy(&self) -> Result<(), BoxError> {
        Ok(())
    }
}
