//! Unwrapping of the ZIP archives returned by the download service.

use crate::GarminError;
use std::io::{Cursor, Read};

const ZIP_MAGIC: &[u8] = b"PK";

/// Return the FIT payload contained in a download response.
///
/// Original-format downloads arrive as a ZIP archive holding the device file.
/// The first entry whose name ends in `.fit` (any case) is returned. Payloads
/// that are not ZIP archives are passed through untouched.
pub fn extract_fit_bytes(payload: Vec<u8>) -> Result<Vec<u8>, GarminError> {
    if !payload.starts_with(ZIP_MAGIC) {
        return Ok(payload);
    }

    let mut archive = zip::ZipArchive::new(Cursor::new(payload))
        .map_err(|e| GarminError::Archive(e.to_string()))?;
    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .map_err(|e| GarminError::Archive(e.to_string()))?;
        if !entry.name().to_lowercase().ends_with(".fit") {
            continue;
        }
        // Header sizes come from the server and are not trusted.
        let mut bytes = Vec::new();
        entry
            .read_to_end(&mut bytes)
            .map_err(|e| GarminError::Archive(e.to_string()))?;
        tracing::debug!(entry = entry.name(), size = bytes.len(), "extracted FIT entry");
        return Ok(bytes);
    }
    Err(GarminError::MissingFitPayload)
}
