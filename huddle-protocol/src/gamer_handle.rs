//! Platform-tagged participant identity.

use huddle_utils::serial::{BitReader, BitWriter, ReadFrom, WriteTo};
use serde::{Deserialize, Serialize};

use crate::WireError;

/// Platform a gamer handle belongs to.
///
/// Discriminants are the tag bytes used on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Platform {
    /// Xbox network account.
    Xbox = 1,
    /// PlayStation network account.
    PlayStation = 2,
    /// PC account. The only platform whose numeric identity travels on the wire.
    Pc = 3,
}

impl TryFrom<u8> for Platform {
    type Error = WireError;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        match tag {
            1 => Ok(Self::Xbox),
            2 => Ok(Self::PlayStation),
            3 => Ok(Self::Pc),
            other => Err(WireError::UnknownPlatform(other)),
        }
    }
}

/// Identifies the sender of a message on the wire.
///
/// Console handles carry no numeric identity, so two console handles on the
/// same platform compare equal. Use the directory's participant id when a
/// stable key is needed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GamerHandle {
    platform: Platform,
    account_id: i64,
    padding: u8,
}

impl GamerHandle {
    /// A PC handle for the given account.
    #[must_use]
    pub const fn pc(account_id: i64) -> Self {
        Self {
            platform: Platform::Pc,
            account_id,
            padding: 0,
        }
    }

    /// A console handle. Its identity is not serialized.
    #[must_use]
    pub const fn console(platform: Platform) -> Self {
        Self {
            platform,
            account_id: 0,
            padding: 0,
        }
    }

    /// Replaces the padding byte sent after a PC account id.
    #[must_use]
    pub const fn with_padding(mut self, padding: u8) -> Self {
        if matches!(self.platform, Platform::Pc) {
            self.padding = padding;
        }
        self
    }

    /// The handle's platform.
    #[must_use]
    pub const fn platform(&self) -> Platform {
        self.platform
    }

    /// The numeric account id, present for PC handles only.
    #[must_use]
    pub const fn account_id(&self) -> Option<i64> {
        match self.platform {
            Platform::Pc => Some(self.account_id),
            Platform::Xbox | Platform::PlayStation => None,
        }
    }

    /// The padding byte (always 0 off PC).
    #[must_use]
    pub const fn padding(&self) -> u8 {
        self.padding
    }

    /// Reads a handle, branching on the platform tag for the optional fields.
    pub fn read(reader: &mut BitReader<'_>) -> Result<Self, WireError> {
        let platform = Platform::try_from(u8::read(reader)?)?;
        if platform != Platform::Pc {
            return Ok(Self::console(platform));
        }
        let account_id = i64::read(reader)?;
        let padding = u8::read(reader)?;
        Ok(Self::pc(account_id).with_padding(padding))
    }
}

impl WriteTo for GamerHandle {
    fn write(&self, writer: &mut BitWriter) {
        (self.platform as u8).write(writer);
        if self.platform == Platform::Pc {
            self.account_id.write(writer);
            self.padding.write(writer);
        }
    }
}
