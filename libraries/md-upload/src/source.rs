//! Recognising device-native ATRAC3 material.
//!
//! Two containers carry ATRAC3 that the device accepts without conversion:
//! RIFF/WAVE with format tag `0x0270`, and OMA (an `EA3` header, optionally
//! behind an `ea3` tag). The frame size picks the density: 384 bytes per
//! frame is LP2, 192 is LP4. Anything else in those containers cannot be
//! written.

use crate::error::{Result, UploadError};
use crate::types::SourceKind;
use md_core::Wireformat;
use std::path::Path;
use tokio::io::AsyncReadExt;

const WAVE_FORMAT_ATRAC3: u16 = 0x0270;
const OMA_CODEC_ATRAC3: u8 = 0;
const LP2_FRAME_SIZE: usize = 384;
const LP4_FRAME_SIZE: usize = 192;
const EA3_TAG_HEADER_LEN: usize = 10;

/// Bytes read from a file when looking for a container header
const PROBE_LEN: u64 = 1 << 20;

fn u16_le(b: &[u8], at: usize) -> Option<u16> {
    Some(u16::from_le_bytes(b.get(at..at + 2)?.try_into().ok()?))
}

fn u32_le(b: &[u8], at: usize) -> Option<u32> {
    Some(u32::from_le_bytes(b.get(at..at + 4)?.try_into().ok()?))
}

fn u16_be(b: &[u8], at: usize) -> Option<u16> {
    Some(u16::from_be_bytes(b.get(at..at + 2)?.try_into().ok()?))
}

fn density(frame_size: usize) -> Result<Wireformat> {
    match frame_size {
        LP2_FRAME_SIZE => Ok(Wireformat::Lp2),
        LP4_FRAME_SIZE => Ok(Wireformat::Lp4),
        other => Err(UploadError::Unsupported(format!(
            "ATRAC3 with {} byte frames",
            other
        ))),
    }
}

/// Classify a file from its leading bytes
pub fn detect_source(header: &[u8]) -> Result<SourceKind> {
    if header.starts_with(b"RIFF") && header.get(8..12) == Some(&b"WAVE"[..]) {
        return detect_wave(header);
    }
    detect_oma(header)
}

fn detect_wave(header: &[u8]) -> Result<SourceKind> {
    let mut at = 12;
    let mut atrac_frame = None;

    while let (Some(id), Some(size)) = (header.get(at..at + 4), u32_le(header, at + 4)) {
        let body = at + 8;
        match id {
            b"fmt " => {
                if u16_le(header, body) != Some(WAVE_FORMAT_ATRAC3) {
                    return Ok(SourceKind::Encode);
                }
                let block_align = u16_le(header, body + 12)
                    .ok_or_else(|| UploadError::Unsupported("truncated fmt chunk".into()))?;
                atrac_frame = Some(block_align as usize);
            }
            b"data" => {
                return match atrac_frame {
                    Some(frame) => Ok(SourceKind::PreEncoded {
                        format: density(frame)?,
                        bytes_to_skip: body,
                    }),
                    None => Ok(SourceKind::Encode),
                };
            }
            _ => {}
        }
        // Chunks are padded to an even length
        at = body + size as usize + (size as usize & 1);
    }

    match atrac_frame {
        Some(_) => Err(UploadError::Unsupported("ATRAC3 WAV without data".into())),
        None => Ok(SourceKind::Encode),
    }
}

fn detect_oma(header: &[u8]) -> Result<SourceKind> {
    let mut at = 0;
    if header.starts_with(b"ea3") {
        // ID3-style size: four bytes of seven bits each
        let size = header
            .get(6..10)
            .ok_or_else(|| UploadError::Unsupported("truncated ea3 tag".into()))?
            .iter()
            .fold(0usize, |acc, b| (acc << 7) | (*b as usize & 0x7F));
        at = EA3_TAG_HEADER_LEN + size;
    }

    if header.get(at..at + 3) != Some(&b"EA3"[..]) {
        return Ok(SourceKind::Encode);
    }

    let truncated = || UploadError::Unsupported("truncated EA3 header".into());
    let header_len = u16_be(header, at + 4).ok_or_else(truncated)? as usize;
    let codec = *header.get(at + 32).ok_or_else(truncated)?;
    if codec != OMA_CODEC_ATRAC3 {
        return Err(UploadError::Unsupported(format!("OMA codec {}", codec)));
    }
    let params = header.get(at + 33..at + 36).ok_or_else(truncated)?;
    let params = u32::from_be_bytes([0, params[0], params[1], params[2]]) as usize;

    Ok(SourceKind::PreEncoded {
        format: density((params & 0x3FF) * 8)?,
        bytes_to_skip: at + header_len,
    })
}

/// Classify a file on disk
pub async fn probe_source(path: &Path) -> Result<SourceKind> {
    let file = tokio::fs::File::open(path).await?;
    let mut header = Vec::new();
    file.take(PROBE_LEN).read_to_end(&mut header).await?;
    detect_source(&header)
}
