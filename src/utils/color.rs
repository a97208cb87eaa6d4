//! Color parsing utilities
//!
//! Colors in config files are RRGGBB or RRGGBBAA hex strings.

/// Parse 6-digit hex color (e.g., "ff0000" -> (255, 0, 0))
/// Also supports 3-digit short format (e.g., "f00" -> (255, 0, 0))
/// Returns None on invalid input.
pub fn parse_hex_color(hex: &str) -> Option<(u8, u8, u8)> {
    let hex = hex.trim_start_matches('#');
    if !hex.is_ascii() {
        return None;
    }
    match hex.len() {
        6 => {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            Some((r, g, b))
        }
        3 => {
            // Short format: expand F -> FF
            let r = u8::from_str_radix(&hex[0..1], 16).ok()? * 17;
            let g = u8::from_str_radix(&hex[1..2], 16).ok()? * 17;
            let b = u8::from_str_radix(&hex[2..3], 16).ok()? * 17;
            Some((r, g, b))
        }
        _ => None,
    }
}

/// Parse RRGGBB or RRGGBBAA to [f32; 4] RGBA (alpha = 1.0 when omitted)
/// Returns None on invalid input.
pub fn parse_hex_color_to_rgba(hex: &str) -> Option<[f32; 4]> {
    let trimmed = hex.trim_start_matches('#');
    let (rgb, alpha) = if trimmed.len() == 8 && trimmed.is_ascii() {
        let a = u8::from_str_radix(&trimmed[6..8], 16).ok()?;
        (&trimmed[0..6], a as f32 / 255.0)
    } else {
        (trimmed, 1.0)
    };
    let (r, g, b) = parse_hex_color(rgb)?;
    Some([r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0, alpha])
}
