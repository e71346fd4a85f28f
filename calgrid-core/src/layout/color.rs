//! Stable palette indices for event colors.
//!
//! The mapping is a presentation contract, not a cryptographic hash: the same
//! id always gets the same index for a given palette size, whatever order the
//! events are rendered in.

pub const DEFAULT_PALETTE_SIZE: usize = 12;

/// Palette slot for an event id.
///
/// Numeric ids map to `id mod palette_size`; anything else goes through the
/// 31-multiplier string hash over UTF-16 code units, wrapping at 32 bits.
pub fn palette_index(id: &str, palette_size: usize) -> usize {
    if palette_size == 0 {
        return 0;
    }
    if let Ok(numeric) = id.trim().parse::<u64>() {
        return (numeric % palette_size as u64) as usize;
    }
    let hash = id.encode_utf16().fold(0i32, |hash, unit| {
        hash.wrapping_shl(5)
            .wrapping_sub(hash)
            .wrapping_add(i32::from(unit))
    });
    hash.unsigned_abs() as usize % palette_size
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_ids_use_modulo() {
        assert_eq!(palette_index("0", 12), 0);
        assert_eq!(palette_index("13", 12), 1);
        assert_eq!(palette_index("120", 12), 0);
    }

    #[test]
    fn string_ids_are_stable() {
        // "abc" hashes to 96354
        assert_eq!(palette_index("abc", 12), 96354 % 12);
        assert_eq!(palette_index("abc", 12), palette_index("abc", 12));
        assert!(palette_index("evt-7f3a9c21@example.com", 12) < 12);
    }

    #[test]
    fn long_ids_wrap_without_panicking() {
        let id = "x".repeat(10_000);
        assert!(palette_index(&id, 7) < 7);
    }

    #[test]
    fn empty_palette_is_zero() {
        assert_eq!(palette_index("abc", 0), 0);
    }
}
