//! Row codec
//!
//! Rows have a fixed schema and serialize to a fixed-width byte span with no
//! delimiters, so a leaf cell is always `key + ROW_SIZE` bytes.
//!
//! ## Row Format
//! ```text
//! ┌──────────┬────────────────────┬──────────────────────────────┐
//! │ id (4)   │ username (32)      │ email (255)                  │
//! │ u32 LE   │ zero padded        │ zero padded                  │
//! └──────────┴────────────────────┴──────────────────────────────┘
//! ```

use bytes::{Buf, BufMut};

use crate::error::{DbError, Result};

pub const ID_SIZE: usize = std::mem::size_of::<u32>();
pub const USERNAME_SIZE: usize = 32;
pub const EMAIL_SIZE: usize = 255;

pub const ID_OFFSET: usize = 0;
pub const USERNAME_OFFSET: usize = ID_OFFSET + ID_SIZE;
pub const EMAIL_OFFSET: usize = USERNAME_OFFSET + USERNAME_SIZE;

/// Serialized width of a row
pub const ROW_SIZE: usize = ID_SIZE + USERNAME_SIZE + EMAIL_SIZE;

/// A single table row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    id: u32,
    username: String,
    email: String,
}

impl Row {
    /// Build a row, rejecting fields that do not fit their fixed width.
    ///
    /// Text is NUL padded on disk and read back up to the first NUL, so a
    /// field containing one is rejected as well.
    pub fn new(id: u32, username: impl Into<String>, email: impl Into<String>) -> Result<Self> {
        let username = username.into();
        let email = email.into();

        if username.len() > USERNAME_SIZE {
            return Err(DbError::InvalidRow(format!(
                "username is {} bytes, limit is {}",
                username.len(),
                USERNAME_SIZE
            )));
        }
        if email.len() > EMAIL_SIZE {
            return Err(DbError::InvalidRow(format!(
                "email is {} bytes, limit is {}",
                email.len(),
                EMAIL_SIZE
            )));
        }

        for (name, value) in [("username", &username), ("email", &email)] {
            if let Some(pos) = value.find('\0') {
                return Err(DbError::InvalidRow(format!(
                    "{} contains a NUL byte at offset {}",
                    name, pos
                )));
            }
        }

        Ok(Self { id, username, email })
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    /// Serialize into a fresh fixed-width buffer
    pub fn to_bytes(&self) -> [u8; ROW_SIZE] {
        let mut out = [0u8; ROW_SIZE];
        self.serialize(&mut out);
        out
    }

    /// Serialize into `dest`, which must be exactly `ROW_SIZE` bytes
    pub fn serialize(&self, dest: &mut [u8; ROW_SIZE]) {
        let mut buf = &mut dest[..];
        buf.put_u32_le(self.id);
        put_fixed(&mut buf, self.username.as_bytes(), USERNAME_SIZE);
        put_fixed(&mut buf, self.email.as_bytes(), EMAIL_SIZE);
    }

    /// Deserialize from a row span (at least `ROW_SIZE` bytes)
    ///
    /// Text fields end at their first NUL byte; whatever follows is ignored.
    pub fn deserialize(src: &[u8]) -> Result<Self> {
        if src.len() < ROW_SIZE {
            return Err(DbError::Corrupted(format!(
                "row span is {} bytes, expected {}",
                src.len(),
                ROW_SIZE
            )));
        }

        let mut buf = &src[..ROW_SIZE];
        let id = buf.get_u32_le();
        let username = get_fixed(&mut buf, USERNAME_SIZE, "username")?;
        let email = get_fixed(&mut buf, EMAIL_SIZE, "email")?;

        Ok(Self { id, username, email })
    }
}

impl std::fmt::Display for Row {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.id, self.username, self.email)
    }
}

// =============================================================================
// Field Helpers
// =============================================================================

fn put_fixed(buf: &mut &mut [u8], field: &[u8], width: usize) {
    buf.put_slice(field);
    buf.put_bytes(0, width - field.len());
}

fn get_fixed(buf: &mut &[u8], width: usize, name: &str) -> Result<String> {
    let raw = &buf[..width];
    let end = raw.iter().position(|&b| b == 0).unwrap_or(width);
    let text = std::str::from_utf8(&raw[..end])
        .map_err(|e| DbError::Corrupted(format!("{} is not valid UTF-8: {}", name, e)))?
        .to_string();
    buf.advance(width);
    Ok(text)
}
