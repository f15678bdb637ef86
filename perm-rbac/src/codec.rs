//! # Permission Codec
//!
//! Converts human-readable permission spec strings to the packed 12-bit
//! representation and back.
//!
//! A spec string is a whitespace-separated list of `<tier><flags>` tokens:
//!
//! ```text
//! "o:-r-- u:-ru- a:crud s:-r-d"
//!   │      │      │      └ system tier: read, delete
//!   │      │      └ agent tier: create, read, update, delete
//!   │      └ user tier: read, update
//!   └ owner tier: ignored
//! ```
//!
//! Tokens with an unknown tier letter or fewer than two characters are
//! skipped. Flag characters are matched case-insensitively against `c r u d`;
//! anything else (`:`, `-`) is ignored.

use crate::actions::Action;
use crate::tiers::Tier;

/// Largest value a decoded permission can take.
pub const MAX_PERM: u16 = 0xFFF;

/// Convert a permission spec string to its packed value.
///
/// Evaluated at compile time when used in constant position, which is how
/// the [`BASE`](crate::BASE) table is built.
///
/// # Example
///
/// ```
/// use perm_rbac::codec::decode;
///
/// assert_eq!(decode("u:-ru-"), 0x6);
/// assert_eq!(decode("u:r u:u"), 0x6);
/// assert_eq!(decode("o:crud u:---- a:crud s:-r-d"), 0x5F0);
/// assert_eq!(decode("x:crud ?"), 0);
/// ```
pub const fn decode(spec: &str) -> u16 {
    let bytes = spec.as_bytes();
    let mut tiers = [0u16; 3];
    let mut i = 0;

    while i < bytes.len() {
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        let start = i;
        while i < bytes.len() && !bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i - start < 2 {
            continue;
        }

        let slot = match Tier::parse(bytes[start]) {
            Some(Tier::User) => 0,
            Some(Tier::Agent) => 1,
            Some(Tier::System) => 2,
            None => continue,
        };

        let mut j = start + 1;
        while j < i {
            tiers[slot] |= flag_bit(bytes[j]);
            j += 1;
        }
    }

    tiers[0] | (tiers[1] << 4) | (tiers[2] << 8)
}

const fn flag_bit(c: u8) -> u16 {
    match c.to_ascii_lowercase() {
        b'c' => Action::Create.bit(),
        b'r' => Action::Read.bit(),
        b'u' => Action::Update.bit(),
        b'd' => Action::Delete.bit(),
        _ => 0,
    }
}

/// Render a packed value as a spec string.
///
/// The owner tier is never emitted, so `decode(encode(p)) == p` holds but
/// `encode(decode(s)) == s` does not for strings that carry an `o:` token.
///
/// ```
/// use perm_rbac::codec::encode;
///
/// assert_eq!(encode(0x5F6), "u:-ru- a:crud s:-r-d");
/// assert_eq!(encode(0), "u:---- a:---- s:----");
/// ```
pub fn encode(perm: u16) -> String {
    Tier::ALL
        .iter()
        .map(|tier| {
            let flags = tier.extract(perm);
            let mut token = String::with_capacity(6);
            token.push(tier.letter());
            token.push(':');
            for action in Action::ALL {
                if flags & action.bit() != 0 {
                    token.push(action.letter());
                } else {
                    token.push('-');
                }
            }
            token
        })
        .collect::<Vec<_>>()
        .join(" ")
}
