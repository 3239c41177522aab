//! Reference types for string pool entries and resource identifiers.
//!
//! Both are plain 32-bit lookup keys on the wire, with `0xFFFFFFFF` reserved
//! for "no reference". They never own the data they point at.

/// Wire value marking an absent reference.
pub const NO_ENTRY: u32 = 0xFFFF_FFFF;

/// Reference to a string in a string pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct StringRef {
    raw: u32,
}

impl StringRef {
    /// Create a reference to the string at `index`.
    #[inline]
    pub const fn new(index: u32) -> Self {
        Self { raw: index }
    }

    /// Create a null string reference.
    #[inline]
    pub const fn null() -> Self {
        Self { raw: NO_ENTRY }
    }

    /// Create a reference from its wire value.
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self { raw }
    }

    /// Create a reference from an optional index.
    #[inline]
    pub fn from_index(index: Option<u32>) -> Self {
        Self::from_raw(index.unwrap_or(NO_ENTRY))
    }

    /// Check if this is a null reference.
    #[inline]
    pub const fn is_null(&self) -> bool {
        self.raw == NO_ENTRY
    }

    /// Get the string index, or `None` for a null reference.
    #[inline]
    pub const fn index(&self) -> Option<u32> {
        if self.is_null() {
            None
        } else {
            Some(self.raw)
        }
    }

    /// Get the wire value.
    #[inline]
    pub const fn raw(&self) -> u32 {
        self.raw
    }
}

impl Default for StringRef {
    fn default() -> Self {
        Self::null()
    }
}

/// Reference to a resource by its `0xPPTTEEEE` identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ResRef {
    raw: u32,
}

impl ResRef {
    /// Create a reference to resource `ident`.
    #[inline]
    pub const fn new(ident: u32) -> Self {
        Self { raw: ident }
    }

    /// Create a null resource reference.
    #[inline]
    pub const fn null() -> Self {
        Self { raw: NO_ENTRY }
    }

    /// Create a reference from its wire value.
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self { raw }
    }

    /// Check if this is a null reference.
    #[inline]
    pub const fn is_null(&self) -> bool {
        self.raw == NO_ENTRY
    }

    /// Get the resource identifier, or `None` for a null reference.
    #[inline]
    pub const fn ident(&self) -> Option<u32> {
        if self.is_null() {
            None
        } else {
            Some(self.raw)
        }
    }

    /// Get the wire value.
    #[inline]
    pub const fn raw(&self) -> u32 {
        self.raw
    }

    /// Package id (`PP`) of a present reference.
    pub fn package_id(&self) -> Option<u8> {
        self.ident().map(|id| (id >> 24) as u8)
    }

    /// Type id (`TT`) of a present reference.
    pub fn type_id(&self) -> Option<u8> {
        self.ident().map(|id| (id >> 16) as u8)
    }

    /// Entry index (`EEEE`) of a present reference.
    pub fn entry_index(&self) -> Option<u16> {
        self.ident().map(|id| id as u16)
    }
}

impl Default for ResRef {
    fn default() -> Self {
        Self::null()
    }
}
