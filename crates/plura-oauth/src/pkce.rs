// SPDX-FileCopyrightText: 2026 Plura Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! PKCE and state token generation.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::Rng;
use sha2::{Digest, Sha256};

use plura_core::PkceParams;

/// RFC 7636 unreserved characters for the code verifier.
const VERIFIER_CHARSET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-._~";

const VERIFIER_LEN: usize = 43;

/// Generates a fresh PKCE verifier/challenge pair (S256).
pub fn generate_pkce() -> PkceParams {
    let mut rng = rand::thread_rng();
    let code_verifier: String = (0..VERIFIER_LEN)
        .map(|_| VERIFIER_CHARSET[rng.gen_range(0..VERIFIER_CHARSET.len())] as char)
        .collect();

    let digest = Sha256::digest(code_verifier.as_bytes());
    let code_challenge = URL_SAFE_NO_PAD.encode(digest);

    PkceParams {
        code_verifier,
        code_challenge,
        challenge_method: "S256".to_string(),
    }
}

/// Generates an unguessable state token: 32 random bytes, base64url.
pub fn generate_state_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
