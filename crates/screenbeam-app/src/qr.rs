//! Terminal QR rendering for share links.

use qrcode::{Color, EcLevel, QrCode};
use screenbeam_session::ShareLink;

/// Light modules kept around the symbol so scanners can find its edges.
const QUIET_ZONE: usize = 2;
const INDENT: &str = "  ";

/// Render the link a viewer should open, ready to print under it.
pub fn render_share_qr(link: &ShareLink) -> Option<String> {
    render_qr_unicode(link.as_str(), QUIET_ZONE)
}

/// Render `data` with Unicode half-blocks, two module rows per text line,
/// padded by `quiet_zone` light modules on every side. High error
/// correction so a phone camera can read it off a screen.
pub fn render_qr_unicode(data: &str, quiet_zone: usize) -> Option<String> {
    let code = QrCode::with_error_correction_level(data.as_bytes(), EcLevel::H).ok()?;
    let width = code.width();
    let colors = code.to_colors();
    let side = width + 2 * quiet_zone;

    let dark = |x: usize, y: usize| -> bool {
        let (Some(x), Some(y)) = (x.checked_sub(quiet_zone), y.checked_sub(quiet_zone)) else {
            return false;
        };
        x < width && y < width && colors[y * width + x] == Color::Dark
    };

    let mut out = String::with_capacity((side + INDENT.len() + 1) * side.div_ceil(2));
    for top in (0..side).step_by(2) {
        out.push_str(INDENT);
        out.extend((0..side).map(|x| match (dark(x, top), dark(x, top + 1)) {
            (true, true) => '█',
            (true, false) => '▀',
            (false, true) => '▄',
            (false, false) => ' ',
        }));
        out.push('\n');
    }
    Some(out)
}
