//! QR code rendering for the server URL.
//!
//! At startup the server prints its reachable URL as a QR code so a
//! phone on the same network can open it without typing. The code is
//! rendered with Unicode half-block characters, two QR rows per terminal
//! line.

use qrcode::QrCode;

/// Quiet zone (border) size in modules.
const QUIET_ZONE: usize = 4;

/// Render `url` as a terminal QR code.
///
/// Uses Unicode block characters, processing two module rows per output
/// line:
/// - Upper half block (U+2580): dark module on top, light below
/// - Lower half block (U+2584): light module on top, dark below
/// - Full block (U+2588): two dark modules
/// - Space: two light modules
///
/// # Errors
/// Returns an error if the QR code cannot be generated.
pub fn terminal_qr(url: &str) -> anyhow::Result<String> {
    let code = QrCode::new(url.as_bytes())?;
    let modules = code.to_colors();
    let width = code.width();

    let mut output = String::new();

    // Top quiet zone
    let full_width = width + 2 * QUIET_ZONE;
    for _ in 0..QUIET_ZONE / 2 {
        output.push_str(&" ".repeat(full_width));
        output.push('\n');
    }

    let height = modules.len() / width;
    let mut row = 0;
    while row < height {
        output.push_str(&" ".repeat(QUIET_ZONE));

        for col in 0..width {
            let top_dark = modules[row * width + col] == qrcode::Color::Dark;
            let bottom_dark = if row + 1 < height {
                modules[(row + 1) * width + col] == qrcode::Color::Dark
            } else {
                false
            };

            let ch = match (top_dark, bottom_dark) {
                (true, true) => '\u{2588}',  // Full block
                (true, false) => '\u{2580}', // Upper half block
                (false, true) => '\u{2584}', // Lower half block
                (false, false) => ' ',
            };
            output.push(ch);
        }

        output.push_str(&" ".repeat(QUIET_ZONE));
        output.push('\n');
        row += 2;
    }

    // Bottom quiet zone
    for _ in 0..QUIET_ZONE / 2 {
        output.push_str(&" ".repeat(full_width));
        output.push('\n');
    }

    Ok(output)
}
