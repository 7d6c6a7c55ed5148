//! Hex color parsing for stroke styles.

use peniko::Color;

/// Default ink color.
pub const DEFAULT_INK_HEX: &str = "#000000";

/// Parse a CSS-style hex color (`#rgb`, `#rrggbb`, `#rrggbbaa`).
///
/// Returns `None` for anything else, including named colors.
pub fn parse_hex_color(color: &str) -> Option<Color> {
    let hex = color.trim().strip_prefix('#')?;
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();

    match hex.len() {
        3 => {
            // #rgb -> #rrggbb
            let r = channel(0..1)? * 17;
            let g = channel(1..2)? * 17;
            let b = channel(2..3)? * 17;
            Some(Color::from_rgba8(r, g, b, 255))
        }
        6 => Some(Color::from_rgba8(channel(0..2)?, channel(2..4)?, channel(4..6)?, 255)),
        8 => Some(Color::from_rgba8(
            channel(0..2)?,
            channel(2..4)?,
            channel(4..6)?,
            channel(6..8)?,
        )),
        _ => None,
    }
}

/// Parse a stroke color, falling back to black for unparseable input.
///
/// Used when painting strokes that came from deserialized data.
pub fn ink_color(color: &str) -> Color {
    parse_hex_color(color).unwrap_or_else(|| {
        log::debug!("Unparseable stroke color {:?}, painting black", color);
        Color::from_rgba8(0, 0, 0, 255)
    })
}

/// Format a color as `#rrggbb` (or `#rrggbbaa` when not opaque).
pub fn to_hex(color: Color) -> String {
    let rgba = color.to_rgba8();
    if rgba.a == 255 {
        format!("#{:02x}{:02x}{:02x}", rgba.r, rgba.g, rgba.b)
    } else {
        format!("#{:02x}{:02x}{:02x}{:02x}", rgba.r, rgba.g, rgba.b, rgba.a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_long_form() {
        let rgba = parse_hex_color("#1e40af").unwrap().to_rgba8();
        assert_eq!((rgba.r, rgba.g, rgba.b, rgba.a), (0x1e, 0x40, 0xaf, 255));
    }

    #[test]
    fn test_parse_short_form() {
        let rgba = parse_hex_color("#f80").unwrap().to_rgba8();
        assert_eq!((rgba.r, rgba.g, rgba.b), (255, 136, 0));
    }

    #[test]
    fn test_parse_with_alpha() {
        let rgba = parse_hex_color("#00000080").unwrap().to_rgba8();
        assert_eq!(rgba.a, 0x80);
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(parse_hex_color("black").is_none());
        assert!(parse_hex_color("#12345").is_none());
        assert!(parse_hex_color("#gggggg").is_none());
        assert!(parse_hex_color("").is_none());
    }

    #[test]
    fn test_hex_output() {
        assert_eq!(to_hex(Color::from_rgba8(255, 0, 16, 255)), "#ff0010");
        assert_eq!(to_hex(ink_color("not a color")), "#000000");
    }
}
