//! Challenge-response handshake with the Syscon.
//!
//! Both variants exchange the same cryptographic material:
//!
//! 1. The host sends a fixed challenge. The device answers with a 16-byte
//!    header followed by three AES blocks encrypted under [`SC2TB`].
//! 2. The decrypted body must carry eight zero bytes, [`AUTH_VALUE`] and
//!    sixteen zero bytes at 0x08, 0x10 and 0x20.
//! 3. The host swaps the two 8-byte halves of the first decrypted block,
//!    zero-fills the rest, encrypts under [`TB2SC`] and sends it back behind
//!    [`AUTH2_HEADER`].
//!
//! CXR and SW wrap the two messages in `AUTH1`/`AUTH2` commands and read
//! status codes; CXRF opens the console with `scopen` and matches on the
//! `SC_READY`/`SC_SUCCESS` banners instead.

use tracing::{debug, info, warn};

use crate::crypto::{
    constantly_compare, decrypt_cbc, encrypt_cbc, AUTH1R_HEADER, AUTH2_HEADER, AUTH_VALUE, SC2TB,
    TB2SC, ZERO_IV,
};
use crate::error::{AuthFault, Result, SysconError};
use crate::port::SerialPort;
use crate::proto::Mode;
use crate::session::{Session, PROTOCOL_WAIT};

/// Challenge sent as the AUTH1 argument (64 bytes of hex).
pub const AUTH1_CHALLENGE: &str =
    "10000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000";

const AUTH1_MIN_LEN: usize = 0x40;
/// Decrypted AUTH1 body and AUTH2 plaintext size.
pub const BODY_LEN: usize = 0x30;
const CXRF_AUTH1_HEX_LEN: usize = 128;

/// Progress through either handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Idle,
    /// CXRF console opened with `scopen`.
    Opened,
    Auth1Sent,
    Auth1Verified,
    Auth2Sent,
    Authenticated,
    Failed,
}

struct Handshake<'s, P: SerialPort> {
    session: &'s mut Session<P>,
    state: AuthState,
}

impl<'s, P: SerialPort> Handshake<'s, P> {
    fn enter(&mut self, next: AuthState) {
        debug!(from = ?self.state, to = ?next, "auth");
        self.state = next;
    }

    fn reject(&mut self, fault: AuthFault) -> SysconError {
        warn!(state = ?self.state, %fault, "auth response rejected");
        self.enter(AuthState::Failed);
        SysconError::InvalidAuthResponse(fault)
    }

    fn refuse(&mut self) -> SysconError {
        warn!(state = ?self.state, "device refused AUTH2");
        self.enter(AuthState::Failed);
        SysconError::AuthFailed
    }

    fn run_cxr(&mut self) -> Result<()> {
        let auth1 = self
            .session
            .command(&format!("AUTH1 {AUTH1_CHALLENGE}"), PROTOCOL_WAIT);
        self.enter(AuthState::Auth1Sent);
        if auth1.code() != 0 || auth1.data().is_empty() {
            return Err(self.reject(AuthFault::CommandFailed));
        }
        let Ok(auth1r) = hex::decode(&auth1.data()[0]) else {
            return Err(self.reject(AuthFault::Decode));
        };

        let data = self.verify(&auth1r)?;
        let auth2 = auth2_payload(&data)?;

        let reply = self
            .session
            .command(&format!("AUTH2 {auth2}"), PROTOCOL_WAIT);
        self.enter(AuthState::Auth2Sent);
        if reply.code() != 0 {
            return Err(self.refuse());
        }
        self.enter(AuthState::Authenticated);
        Ok(())
    }

    fn run_cxrf(&mut self) -> Result<()> {
        let open = self.session.command("scopen", PROTOCOL_WAIT);
        if !open.data().first().is_some_and(|t| t.contains("SC_READY")) {
            return Err(self.reject(AuthFault::NotReady));
        }
        self.enter(AuthState::Opened);

        let auth1 = self.session.command(AUTH1_CHALLENGE, PROTOCOL_WAIT);
        self.enter(AuthState::Auth1Sent);
        let Some(text) = auth1.data().first() else {
            return Err(self.reject(AuthFault::CommandFailed));
        };
        let auth1r = match cxrf_auth1_hex(text) {
            Ok(hex) => hex::decode(hex).map_err(|_| AuthFault::Decode),
            Err(fault) => Err(fault),
        };
        let auth1r = match auth1r {
            Ok(bytes) => bytes,
            Err(fault) => return Err(self.reject(fault)),
        };

        let data = self.verify(&auth1r)?;
        let auth2 = auth2_payload(&data)?;

        let reply = self.session.command(&auth2, PROTOCOL_WAIT);
        self.enter(AuthState::Auth2Sent);
        if !reply.data().first().is_some_and(|t| t.contains("SC_SUCCESS")) {
            return Err(self.refuse());
        }
        self.enter(AuthState::Authenticated);
        Ok(())
    }

    fn verify(&mut self, auth1r: &[u8]) -> Result<[u8; BODY_LEN]> {
        match verify_auth1(auth1r) {
            Ok(data) => {
                self.enter(AuthState::Auth1Verified);
                Ok(data)
            }
            Err(SysconError::InvalidAuthResponse(fault)) => Err(self.reject(fault)),
            Err(e) => {
                self.enter(AuthState::Failed);
                Err(e)
            }
        }
    }
}

/// Run the handshake matching the session's mode.
pub fn authenticate<P: SerialPort>(session: &mut Session<P>) -> Result<()> {
    let mode = session.mode();
    let mut hs = Handshake {
        session,
        state: AuthState::Idle,
    };
    let outcome = match mode {
        Mode::Cxr | Mode::Sw => hs.run_cxr(),
        Mode::Cxrf => hs.run_cxrf(),
    };
    if outcome.is_ok() {
        info!(%mode, "authenticated");
    }
    outcome
}

/// Check header and body of an AUTH1 answer, returning the decrypted body.
pub fn verify_auth1(auth1r: &[u8]) -> Result<[u8; BODY_LEN]> {
    if auth1r.len() < AUTH1_MIN_LEN || !constantly_compare(&auth1r[..0x10], &AUTH1R_HEADER) {
        return Err(SysconError::InvalidAuthResponse(AuthFault::Header));
    }

    let data: [u8; BODY_LEN] = decrypt_cbc(&SC2TB, &ZERO_IV, &auth1r[0x10..0x40])?
        .try_into()
        .map_err(|_| SysconError::InvalidAuthResponse(AuthFault::Body))?;
    if !constantly_compare(&data[0x08..0x10], &ZERO_IV[..0x08])
        || !constantly_compare(&data[0x10..0x20], &AUTH_VALUE)
        || !constantly_compare(&data[0x20..0x30], &ZERO_IV)
    {
        return Err(SysconError::InvalidAuthResponse(AuthFault::Body));
    }
    Ok(data)
}

/// Upper-case hex of `AUTH2_HEADER || enc(TB2SC, swapped nonce)`.
pub fn auth2_payload(data: &[u8; BODY_LEN]) -> Result<String> {
    let mut block = [0u8; BODY_LEN];
    block[0x00..0x08].copy_from_slice(&data[0x08..0x10]);
    block[0x08..0x10].copy_from_slice(&data[0x00..0x08]);

    let body = encrypt_cbc(&TB2SC, &ZERO_IV, &block)?;
    let mut message = AUTH2_HEADER.to_vec();
    message.extend_from_slice(&body);
    Ok(hex::encode_upper(message))
}

/// The hex body of a CXRF AUTH1 answer: second `\r` segment minus its
/// leading character.
fn cxrf_auth1_hex(text: &str) -> std::result::Result<&str, AuthFault> {
    let mut parts = text.split('\r');
    parts.next();
    let second = parts.next().ok_or(AuthFault::Format)?;
    let mut chars = second.chars();
    if chars.next().is_none() || chars.as_str().is_empty() {
        return Err(AuthFault::Format);
    }
    let hex = chars.as_str();
    if hex.len() != CXRF_AUTH1_HEX_LEN {
        return Err(AuthFault::Length);
    }
    Ok(hex)
}
