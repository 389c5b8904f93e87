//! Block versions and the wire format each one uses

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{codec_for, BlockCodec};
use crate::error::BlockError;

/// Protocol generation of a block. Ordered: every "version >= X" check
/// relies on the declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
#[repr(u8)]
pub enum BlockVersion {
    Genesis = 1,
    Plain = 2,
    /// Variable transaction counts and feature voting
    Ng = 3,
    /// Adds the miner reward vote
    Reward = 4,
    /// Protobuf encoding and digest-based IDs
    Protobuf = 5,
}

impl BlockVersion {
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn wire_format(self) -> WireFormat {
        if self >= BlockVersion::Protobuf {
            WireFormat::Protobuf
        } else {
            WireFormat::Binary
        }
    }

    /// Codec responsible for this version
    pub fn codec(self) -> &'static dyn BlockCodec {
        codec_for(self.wire_format())
    }
}

impl From<BlockVersion> for u8 {
    fn from(v: BlockVersion) -> u8 {
        v as u8
    }
}

impl TryFrom<u8> for BlockVersion {
    type Error = BlockError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(BlockVersion::Genesis),
            2 => Ok(BlockVersion::Plain),
            3 => Ok(BlockVersion::Ng),
            4 => Ok(BlockVersion::Reward),
            5 => Ok(BlockVersion::Protobuf),
            other => Err(BlockError::UnknownVersion(other)),
        }
    }
}

impl fmt::Display for BlockVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

/// On-the-wire representation of a block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WireFormat {
    /// Fixed-layout big-endian format of versions 1-4
    Binary,
    Protobuf,
}

impl fmt::Display for WireFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WireFormat::Binary => f.write_str("binary"),
            WireFormat::Protobuf => f.write_str("protobuf"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_versions_are_ordered() {
        assert!(BlockVersion::Genesis < BlockVersion::Plain);
        assert!(BlockVersion::Plain < BlockVersion::Ng);
        assert!(BlockVersion::Ng < BlockVersion::Reward);
        assert!(BlockVersion::Reward < BlockVersion::Protobuf);
    }

    #[test]
    fn test_wire_format_boundary() {
        assert_eq!(BlockVersion::Reward.wire_format(), WireFormat::Binary);
        assert_eq!(BlockVersion::Protobuf.wire_format(), WireFormat::Protobuf);
        assert_eq!(BlockVersion::Ng.codec().format(), WireFormat::Binary);
        assert_eq!(BlockVersion::Protobuf.codec().format(), WireFormat::Protobuf);
    }

    #[test]
    fn test_unknown_versions_rejected() {
        assert!(matches!(BlockVersion::try_from(0), Err(BlockError::UnknownVersion(0))));
        assert!(matches!(BlockVersion::try_from(6), Err(BlockError::UnknownVersion(6))));
        assert_eq!(BlockVersion::try_from(3).unwrap(), BlockVersion::Ng);
    }

    #[test]
    fn test_json_is_numeric() {
        assert_eq!(serde_json::to_string(&BlockVersion::Reward).unwrap(), "4");
        assert_eq!(serde_json::from_str::<BlockVersion>("5").unwrap(), BlockVersion::Protobuf);
        assert!(serde_json::from_str::<BlockVersion>("9").is_err());
    }
}
