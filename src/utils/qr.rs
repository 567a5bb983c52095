use std::io::Cursor;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use image::{ImageFormat, Luma};
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use qrcode::{EcLevel, QrCode};

use crate::error::AppError;

/// Pixels per QR module in the rendered PNG.
const MODULE_SIZE: u32 = 10;

/// Characters that cannot appear raw in a single path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// `<base>/presence/<matricule>`, tolerating a trailing slash on `base`.
/// The matricule is percent-encoded so it always stays one path segment.
pub fn presence_url(base: &str, matricule: &str) -> String {
    format!(
        "{}/presence/{}",
        base.trim_end_matches('/'),
        utf8_percent_encode(matricule, PATH_SEGMENT)
    )
}

pub fn encode(url: &str) -> Result<QrCode, AppError> {
    QrCode::with_error_correction_level(url.as_bytes(), EcLevel::L)
        .map_err(|e| AppError::CodeRender(e.to_string()))
}

pub fn render_png(url: &str) -> Result<Vec<u8>, AppError> {
    let image = encode(url)?
        .render::<Luma<u8>>()
        .quiet_zone(true)
        .module_dimensions(MODULE_SIZE, MODULE_SIZE)
        .build();

    let mut png = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|e| AppError::CodeRender(e.to_string()))?;

    Ok(png)
}

/// PNG as base64, ready for a `data:image/png;base64,` src.
pub fn png_base64(url: &str) -> Result<String, AppError> {
    Ok(STANDARD.encode(render_png(url)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presence_url_joins_base_and_matricule() {
        assert_eq!(presence_url("https://host/", "A1"), "https://host/presence/A1");
        assert_eq!(presence_url("https://host", "A1"), "https://host/presence/A1");
        assert_eq!(
            presence_url("http://10.0.0.5:5000//", "EMP-7"),
            "http://10.0.0.5:5000/presence/EMP-7"
        );
    }

    #[test]
    fn presence_url_keeps_matricule_in_one_segment() {
        assert_eq!(presence_url("https://host/", "A?1"), "https://host/presence/A%3F1");
        assert_eq!(presence_url("https://host/", "A#1"), "https://host/presence/A%231");
        assert_eq!(presence_url("https://host/", "A/1"), "https://host/presence/A%2F1");
        assert_eq!(
            presence_url("https://host/", "50% B"),
            "https://host/presence/50%25%20B"
        );
        assert_eq!(presence_url("https://host/", "É-7"), "https://host/presence/%C3%89-7");
    }

    #[test]
    fn code_encodes_the_presence_url() {
        let url = presence_url("https://host/", "A1");

        let ours = encode(&url).unwrap();
        let expected =
            QrCode::with_error_correction_level("https://host/presence/A1", EcLevel::L).unwrap();

        assert_eq!(ours.to_colors(), expected.to_colors());
        assert_eq!(ours.error_correction_level(), EcLevel::L);
    }

    #[test]
    fn png_is_deterministic_and_sized_by_modules() {
        let url = "https://host/presence/A1";

        let first = render_png(url).unwrap();
        let second = render_png(url).unwrap();
        assert_eq!(first, second);
        assert_eq!(&first[..8], b"\x89PNG\r\n\x1a\n");

        let decoded = image::load_from_memory_with_format(&first, ImageFormat::Png).unwrap();
        let modules = encode(url).unwrap().width() as u32 + 8; // 4-module quiet zone each side
        assert_eq!(decoded.width(), modules * MODULE_SIZE);
        assert_eq!(decoded.height(), modules * MODULE_SIZE);
    }

    #[test]
    fn base64_round_trips_to_the_png() {
        let url = "https://host/presence/A1";

        let encoded = png_base64(url).unwrap();

        assert_eq!(STANDARD.decode(encoded).unwrap(), render_png(url).unwrap());
    }
}
