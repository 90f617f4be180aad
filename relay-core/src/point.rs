//! Extension point identity.

/// Marker trait identifying a contract as an extension point.
///
/// Implemented on the `dyn Trait` object type of a contract, never on a
/// concrete implementation:
///
/// ```rust,ignore
/// pub trait Transporter: Send + Sync {
///     fn open(&self, target: &Selector) -> Result<String, RelayError>;
/// }
///
/// impl ExtensionPoint for dyn Transporter {
///     const NAME: &'static str = "demo.Transporter";
///     const DEFAULT_NAME: Option<&'static str> = Some("tcp");
/// }
/// ```
///
/// `NAME` doubles as the declaration file name under each loading strategy
/// location. `DEFAULT_NAME` must hold a single name; a value with several
/// comma or whitespace separated tokens is rejected when the contract's
/// descriptors are first built, and the literal token `true` counts as no
/// default at all (it is reserved as a lookup alias for the default).
pub trait ExtensionPoint: Send + Sync + 'static {
    /// Dotted full name of the contract.
    const NAME: &'static str;

    /// Default implementation name, if the contract declares one.
    const DEFAULT_NAME: Option<&'static str> = None;
}
