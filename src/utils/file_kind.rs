/// Detects an image content type from its leading bytes.
pub fn sniff_image(data: &[u8]) -> Option<&'static str> {
    if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
        Some("image/png")
    } else if data.starts_with(&[0xFF, 0xD8]) {
        Some("image/jpeg")
    } else {
        None
    }
}

pub fn is_pdf(data: &[u8]) -> bool {
    data.starts_with(b"%PDF")
}
