/// Convert a top-left Y coordinate to a bottom-left (PDF) Y coordinate.
pub fn flip_y(y: f64, page_height: f64) -> f64 {
    page_height - y
}

/// Clockwise rotation in degrees as a PDF `cm` matrix about the origin.
pub fn rotation_matrix(degrees: f64) -> [f64; 6] {
    let (sin, cos) = (-degrees).to_radians().sin_cos();
    [cos, sin, -sin, cos, 0.0, 0.0]
}

/// Encode text for a WinAnsi (single byte) font. Anything outside Latin-1 becomes `?`.
pub fn to_win_ansi(s: &str) -> Vec<u8> {
    s.chars()
        .map(|c| if (c as u32) <= 255 { c as u8 } else { b'?' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flips_against_page_height() {
        assert_eq!(flip_y(10.0, 842.0), 832.0);
    }

    #[test]
    fn quarter_turn_is_clockwise_on_the_page() {
        let [a, b, c, d, _, _] = rotation_matrix(90.0);
        // PDF y points up, so a clockwise turn maps +x to -y
        assert!(a.abs() < 1e-12 && d.abs() < 1e-12);
        assert!((b + 1.0).abs() < 1e-12);
        assert!((c - 1.0).abs() < 1e-12);
    }

    #[test]
    fn win_ansi_replaces_wide_chars() {
        assert_eq!(to_win_ansi("aé漢"), vec![b'a', 0xE9, b'?']);
    }
}
