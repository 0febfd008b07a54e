use std::fmt::{self, Write};

use crate::codec::NativeConversion;
use crate::types::Value;

/// What a database engine contributes to query resolution.
///
/// Implemented by a zero-sized marker per engine. The resolver and the
/// codec are generic over it, so each engine only supplies its placeholder
/// syntax and the table of values it can bind directly.
pub trait Backend: Send + Sync + 'static {
    /// The driver-level bound value.
    type Native: Clone + fmt::Debug + Send + Sync + 'static;

    /// Label for logs.
    const NAME: &'static str;

    /// Append the placeholder for the 1-based parameter `position`.
    fn write_placeholder(out: &mut String, position: usize);

    /// Fast path: bind `value` directly if the engine has a column type for it.
    fn to_native(value: &Value) -> NativeConversion<Self::Native>;

    /// Wrap a serialized JSON document as a single column value.
    fn json_column(document: Vec<u8>) -> Self::Native;

    /// Bound NULL, used for placeholders with nothing to bind.
    fn null() -> Self::Native;
}

/// `$1`, `$2`, ... placeholders.
pub(crate) fn write_numbered(out: &mut String, prefix: char, position: usize) {
    out.push(prefix);
    // Writing into a String cannot fail.
    let _ = write!(out, "{position}");
}
