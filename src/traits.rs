//! Traits implemented by generated and attribute-expanded code.

/// Sequential ordinal of the active variant of a numbered enum.
///
/// Implemented by the build-generated `<Name>Ext` artifacts. Ordinals start
/// at 1 for each configured root and follow declaration order.
pub trait Ordinal {
    fn ordinal(&self) -> u32;
}

/// Marks an enum carrying `#[ordinal]` and exposes its configuration.
pub trait OrdinalRoot {
    /// Whether nested enums are numbered into this root's count.
    const RECURSIVE: bool;
}

impl<T: Ordinal + ?Sized> Ordinal for &T {
    #[inline]
    fn ordinal(&self) -> u32 {
        (**self).ordinal()
    }
}

impl<T: Ordinal + ?Sized> Ordinal for Box<T> {
    #[inline]
    fn ordinal(&self) -> u32 {
        (**self).ordinal()
    }
}
