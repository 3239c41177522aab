//! Packed bit-field helpers.
//!
//! Several resource records pack multiple sub-fields into one 32-bit word. A
//! field is described by a mask (already shifted down to bit 0) and a shift.

/// Extract the field selected by `mask << shift` from `word`.
#[inline]
pub const fn get_bits(word: u32, mask: u32, shift: u32) -> u32 {
    (word >> shift) & mask
}

/// Replace the field selected by `mask << shift` in `word` with `value`.
///
/// Bits of `value` outside `mask` are discarded; bits of `word` outside the
/// field are preserved.
#[inline]
pub const fn set_bits(word: u32, value: u32, mask: u32, shift: u32) -> u32 {
    (word & !(mask << shift)) | ((value & mask) << shift)
}
