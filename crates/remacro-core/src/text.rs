//! Byte offset to line:column conversion.
//!
//! ## Coordinate Conventions
//!
//! - Lines and columns are **1-indexed** (matching editor conventions)
//! - Byte offsets are **0-indexed**
//! - Columns count Unicode scalar values, not bytes

/// Convert a byte offset to 1-indexed line and column.
///
/// If `offset` exceeds the content length, returns the position at the end
/// of the content. Offsets inside a multi-byte character resolve to the
/// column of that character.
pub fn offset_to_position(content: &str, offset: usize) -> (u32, u32) {
    let mut line = 1u32;
    let mut col = 1u32;

    for (i, ch) in content.char_indices() {
        if i >= offset {
            break;
        }
        if ch == '\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }

    (line, col)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    mod conversions {
        use super::*;

        #[test]
        fn offset_to_position_simple() {
            let content = "abc\ndef\nghi";
            assert_eq!(offset_to_position(content, 0), (1, 1));
            assert_eq!(offset_to_position(content, 2), (1, 3));
            assert_eq!(offset_to_position(content, 4), (2, 1));
            assert_eq!(offset_to_position(content, 9), (3, 2));
        }

        #[test]
        fn offset_beyond_content() {
            assert_eq!(offset_to_position("ab\nc", 100), (2, 2));
        }

        #[test]
        fn columns_count_chars() {
            let content = "é(x)";
            // 'é' is two bytes; '(' starts at byte 2 but is column 2
            assert_eq!(offset_to_position(content, 2), (1, 2));
        }
    }
}
