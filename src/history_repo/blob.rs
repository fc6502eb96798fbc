// Header for the columnar history file. [magic: 4 bytes][version: u8][payload].

pub(super) const MAGIC: &[u8; 4] = b"BSHS";
pub(super) const FORMAT_VERSION: u8 = 1;
const HEADER_LEN: usize = MAGIC.len() + 1;

pub(super) fn with_header(version: u8, payload: Vec<u8>) -> Vec<u8> {
    let mut out = Vec::with_capacity(HEADER_LEN + payload.len());
    out.extend_from_slice(MAGIC);
    out.push(version);
    out.extend_from_slice(&payload);
    out
}

/// Version byte, or `None` when the bytes do not start with the magic.
pub(super) fn header_version(bytes: &[u8]) -> Option<u8> {
    if bytes.len() < HEADER_LEN || &bytes[..MAGIC.len()] != MAGIC {
        return None;
    }
    Some(bytes[MAGIC.len()])
}

pub(super) fn payload(bytes: &[u8]) -> &[u8] {
    bytes.get(HEADER_LEN..).unwrap_or(&[])
}
