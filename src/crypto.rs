//! AES-128-CBC helpers and the fixed keys of the Syscon handshake.
//!
//! All buffers exchanged during authentication are sized to whole AES blocks
//! (0x30 bytes), so no padding is ever applied or stripped here.

use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit, block_padding::NoPadding};

use crate::error::{Result, SysconError};

type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;
type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;

pub const BLOCK_SIZE: usize = 16;

/// Syscon to test bench key (decrypts AUTH1 bodies).
pub const SC2TB: [u8; 16] = [
    0x71, 0xf0, 0x3f, 0x18, 0x4c, 0x01, 0xc5, 0xeb, 0xc3, 0xf6, 0xa2, 0x2a, 0x42, 0xba, 0x95, 0x25,
];

/// Test bench to Syscon key (encrypts AUTH2 bodies).
pub const TB2SC: [u8; 16] = [
    0x90, 0x7e, 0x73, 0x0f, 0x4d, 0x4e, 0x0a, 0x0b, 0x7b, 0x75, 0xf0, 0x30, 0xeb, 0x1d, 0x9d, 0x36,
];

/// Plaintext the device places at 0x10..0x20 of a genuine AUTH1 body.
pub const AUTH_VALUE: [u8; 16] = [
    0x33, 0x50, 0xbd, 0x78, 0x20, 0x34, 0x5c, 0x29, 0x05, 0x6a, 0x22, 0x3b, 0xa2, 0x20, 0xb3, 0x23,
];

pub const ZERO_IV: [u8; 16] = [0; 16];

/// Leading 16 bytes of every AUTH1 response.
pub const AUTH1R_HEADER: [u8; 16] = [
    0x10, 0x10, 0x00, 0x00, 0xff, 0xff, 0xff, 0xff, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];

/// Prepended to the encrypted AUTH2 body.
pub const AUTH2_HEADER: [u8; 16] = [
    0x10, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];

/// AES-128-CBC encrypt a block-aligned buffer.
pub fn encrypt_cbc(key: &[u8], iv: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
    if plaintext.len() % BLOCK_SIZE != 0 {
        return Err(SysconError::EncryptionFailed(
            "plaintext is not a multiple of block size".into(),
        ));
    }
    let cipher = Aes128CbcEnc::new_from_slices(key, iv)
        .map_err(|e| SysconError::EncryptionFailed(e.to_string()))?;

    let mut buf = plaintext.to_vec();
    let len = buf.len();
    cipher
        .encrypt_padded_mut::<NoPadding>(&mut buf, len)
        .map_err(|_| SysconError::EncryptionFailed("block encryption failed".into()))?;
    Ok(buf)
}

/// AES-128-CBC decrypt a block-aligned buffer.
pub fn decrypt_cbc(key: &[u8], iv: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
    if ciphertext.len() % BLOCK_SIZE != 0 {
        return Err(SysconError::DecryptionFailed(
            "ciphertext is not a multiple of block size".into(),
        ));
    }
    let cipher = Aes128CbcDec::new_from_slices(key, iv)
        .map_err(|e| SysconError::DecryptionFailed(e.to_string()))?;

    let mut buf = ciphertext.to_vec();
    cipher
        .decrypt_padded_mut::<NoPadding>(&mut buf)
        .map_err(|_| SysconError::DecryptionFailed("block decryption failed".into()))?;
    Ok(buf)
}

/// Plain byte equality. The keys are public, so timing is not a concern.
pub fn constantly_compare(a: &[u8], b: &[u8]) -> bool {
    a == b
}
