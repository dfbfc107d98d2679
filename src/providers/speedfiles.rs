//! SpeedFiles hides its media url behind a nine step string transform inside an
//! inline player script. Every step is trivially invertible, so [`encode`] is the
//! exact mirror of [`decode`] and the two must stay in lockstep.
//!
//! Decode order:
//! 1. base64 decode
//! 2. swap ASCII letter case
//! 3. reverse
//! 4. base64 decode
//! 5. reverse
//! 6. hex pairs to bytes
//! 7. subtract [`BYTE_SHIFT`] from every byte (wrapping)
//! 8. swap ASCII letter case
//! 9. reverse, then base64 decode

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{DecodeError, DecodeStage, PipelineError};
use crate::scraper::common::PageDocument;

/// Script variable that carries the payload on the SpeedFiles player page.
pub const SPEEDFILES_PAYLOAD_VAR: &str = "_0x5opu234";

pub const BYTE_SHIFT: u8 = 3;

static PAYLOAD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r#"{}\s*=\s*"([^"]*)";"#,
        regex::escape(SPEEDFILES_PAYLOAD_VAR)
    ))
    .unwrap()
});

fn swap_ascii_case(data: &mut [u8]) {
    for b in data.iter_mut() {
        if b.is_ascii_alphabetic() {
            *b ^= 0x20;
        }
    }
}

fn base64_decode(stage: DecodeStage, input: &[u8]) -> Result<Vec<u8>, DecodeError> {
    STANDARD
        .decode(input)
        .map_err(|e| DecodeError::new(stage, e.to_string()))
}

fn hex_digit(b: u8) -> Option<u8> {
    (b as char).to_digit(16).map(|d| d as u8)
}

fn decode_hex_pairs(input: &[u8]) -> Result<Vec<u8>, DecodeError> {
    if input.len() % 2 != 0 {
        return Err(DecodeError::new(
            DecodeStage::HexPairs,
            format!("odd length {}", input.len()),
        ));
    }
    input
        .chunks(2)
        .enumerate()
        .map(|(i, pair)| match (hex_digit(pair[0]), hex_digit(pair[1])) {
            (Some(hi), Some(lo)) => Ok(hi << 4 | lo),
            _ => Err(DecodeError::new(
                DecodeStage::HexPairs,
                format!("invalid hex pair at offset {}", i * 2),
            )),
        })
        .collect()
}

fn encode_hex_pairs(input: &[u8]) -> Vec<u8> {
    input
        .iter()
        .flat_map(|b| format!("{:02x}", b).into_bytes())
        .collect()
}

/// Finds the obfuscated payload in the inline scripts of a SpeedFiles page.
pub fn locate(html_content: &str) -> Option<String> {
    let document = PageDocument::parse(html_content);
    document
        .script_texts()
        .iter()
        .find_map(|script| PAYLOAD_RE.captures(script).map(|c| c[1].to_string()))
}

pub fn decode(payload: &str) -> Result<String, DecodeError> {
    let mut data = base64_decode(DecodeStage::OuterBase64, payload.trim().as_bytes())?;
    swap_ascii_case(&mut data);
    data.reverse();

    let mut data = base64_decode(DecodeStage::InnerBase64, &data)?;
    data.reverse();

    let mut data = decode_hex_pairs(&data)?;
    for b in data.iter_mut() {
        *b = b.wrapping_sub(BYTE_SHIFT);
    }
    swap_ascii_case(&mut data);
    data.reverse();

    let data = base64_decode(DecodeStage::FinalBase64, &data)?;
    String::from_utf8(data).map_err(|e| DecodeError::new(DecodeStage::Utf8, e.to_string()))
}

/// Inverse of [`decode`]: runs the inverse of step 9 down to step 1.
pub fn encode(url: &str) -> String {
    let mut data = STANDARD.encode(url).into_bytes();
    data.reverse();
    swap_ascii_case(&mut data);
    for b in data.iter_mut() {
        *b = b.wrapping_add(BYTE_SHIFT);
    }

    let mut data = encode_hex_pairs(&data);
    data.reverse();

    let mut data = STANDARD.encode(&data).into_bytes();
    data.reverse();
    swap_ascii_case(&mut data);
    STANDARD.encode(&data)
}

pub fn get_direct_link(html_content: &str) -> Result<String, PipelineError> {
    let payload = locate(html_content).ok_or_else(|| PipelineError::NotFound {
        provider: "SpeedFiles".to_string(),
    })?;
    debug!("[SpeedFiles] Found payload ({} chars)", payload.len());
    Ok(decode(&payload)?)
}
