//! Structural decoding of compact JWS tokens.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use serde::Deserialize;

use crate::error::{AuthError, AuthResult};

// Issuers disagree on trailing `=`; accept both forms.
const SEGMENT_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// A token split into its three decoded segments.
///
/// Nothing here is trusted yet: the header and payload bytes are only
/// meaningful once the signature over `signing_input` has been checked.
#[derive(Debug)]
pub struct CompactToken<'a> {
    signing_input: &'a str,
    header: Vec<u8>,
    payload: Vec<u8>,
    signature: Vec<u8>,
}

impl<'a> CompactToken<'a> {
    pub fn parse(token: &'a str, max_bytes: usize) -> AuthResult<Self> {
        if token.len() > max_bytes {
            return Err(AuthError::MalformedToken(format!(
                "token exceeds {max_bytes} bytes"
            )));
        }

        let (signing_input, signature_segment) = token
            .rsplit_once('.')
            .ok_or_else(three_segments_expected)?;
        let (header_segment, payload_segment) = signing_input
            .split_once('.')
            .ok_or_else(three_segments_expected)?;
        if payload_segment.contains('.') {
            return Err(three_segments_expected());
        }

        Ok(Self {
            signing_input,
            header: decode_segment("header", header_segment)?,
            payload: decode_segment("payload", payload_segment)?,
            signature: decode_segment("signature", signature_segment)?,
        })
    }

    /// `header_segment + "." + payload_segment`, exactly as received.
    pub fn signing_input(&self) -> &'a str {
        self.signing_input
    }

    pub fn header_bytes(&self) -> &[u8] {
        &self.header
    }

    pub fn payload_bytes(&self) -> &[u8] {
        &self.payload
    }

    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    pub fn header(&self) -> AuthResult<TokenHeader> {
        serde_json::from_slice(&self.header)
            .map_err(|err| AuthError::MalformedToken(format!("invalid header: {err}")))
    }
}

fn three_segments_expected() -> AuthError {
    AuthError::MalformedToken("expected three dot-separated segments".into())
}

fn decode_segment(name: &str, segment: &str) -> AuthResult<Vec<u8>> {
    if segment.is_empty() {
        return Err(AuthError::MalformedToken(format!("{name} segment is empty")));
    }
    SEGMENT_ENGINE
        .decode(segment)
        .map_err(|err| AuthError::MalformedToken(format!("{name} segment: {err}")))
}

/// JOSE header fields the authenticator looks at.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenHeader {
    pub alg: String,
    #[serde(default)]
    pub typ: Option<String>,
}
