// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Random identifiers from the system CSPRNG.

use ring::rand::{SecureRandom, SystemRandom};

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

fn fill(buf: &mut [u8]) -> anyhow::Result<()> {
    SystemRandom::new()
        .fill(buf)
        .map_err(|_| anyhow::anyhow!("system random source unavailable"))
}

/// `len` random characters from `[0-9a-z]`.
pub fn base36(len: usize) -> anyhow::Result<String> {
    let mut buf = vec![0u8; len];
    fill(&mut buf)?;
    Ok(buf
        .iter()
        .map(|b| BASE36[(*b as usize) % BASE36.len()] as char)
        .collect())
}

/// `bytes` random bytes rendered as lowercase hex.
pub fn hex_id(bytes: usize) -> anyhow::Result<String> {
    let mut buf = vec![0u8; bytes];
    fill(&mut buf)?;
    Ok(buf.iter().map(|b| format!("{:02x}", b)).collect())
}
