//! Transactions carried by blocks
//!
//! The block layer treats transactions as opaque: it needs each one's binary
//! form, its signed protobuf form, its Merkle leaf bytes and a JSON form
//! that can be decoded without knowing the concrete type up front. The
//! [`Transaction`] enum is the closed set of variants this layer knows.

mod collection;
mod genesis;
mod transfer;

pub use collection::*;
pub use genesis::*;
pub use transfer::*;

use bytes::BufMut;
use prost::Message;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::codec::{with_buffer, ByteReader};
use crate::crypto::Digest;
use crate::error::BlockError;
use crate::protobuf as pb;
use crate::Scheme;

/// Transaction type byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
#[repr(u8)]
pub enum TransactionType {
    Genesis = 1,
    Transfer = 4,
}

impl From<TransactionType> for u8 {
    fn from(t: TransactionType) -> u8 {
        t as u8
    }
}

impl TryFrom<u8> for TransactionType {
    type Error = BlockError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(TransactionType::Genesis),
            4 => Ok(TransactionType::Transfer),
            other => Err(BlockError::InvalidTransaction(format!(
                "unknown transaction type {}",
                other
            ))),
        }
    }
}

/// Minimal JSON envelope used to pick the concrete transaction variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct TransactionTypeVersion {
    #[serde(rename = "type")]
    pub tx_type: u8,
    #[serde(default = "default_json_version")]
    pub version: u8,
}

fn default_json_version() -> u8 {
    1
}

impl TransactionTypeVersion {
    /// Map the envelope onto a supported transaction type
    pub fn guess(&self) -> Result<TransactionType, BlockError> {
        let tx_type = TransactionType::try_from(self.tx_type)?;
        let supported = match tx_type {
            TransactionType::Genesis => self.version == GenesisTransaction::VERSION,
            TransactionType::Transfer => TransferTransaction::VERSIONS.contains(&self.version),
        };
        if !supported {
            return Err(BlockError::InvalidTransaction(format!(
                "unsupported version {} for transaction type {}",
                self.version, self.tx_type
            )));
        }
        Ok(tx_type)
    }
}

/// A signed transaction of any supported type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transaction {
    Genesis(GenesisTransaction),
    Transfer(TransferTransaction),
}

impl Transaction {
    pub fn tx_type(&self) -> TransactionType {
        match self {
            Transaction::Genesis(_) => TransactionType::Genesis,
            Transaction::Transfer(_) => TransactionType::Transfer,
        }
    }

    pub fn version(&self) -> u8 {
        match self {
            Transaction::Genesis(tx) => tx.version,
            Transaction::Transfer(tx) => tx.version,
        }
    }

    /// Transaction ID: hash of the unsigned body
    pub fn id(&self) -> Digest {
        match self {
            Transaction::Genesis(tx) => tx.id(),
            Transaction::Transfer(tx) => tx.id(),
        }
    }

    /// Check the transaction is well-formed for the chain and, where
    /// signed, that the signature holds
    pub fn validate(&self, scheme: Scheme) -> Result<(), BlockError> {
        match self {
            Transaction::Genesis(tx) => tx.validate(scheme),
            Transaction::Transfer(tx) => {
                tx.validate(scheme)?;
                if !tx.verify() {
                    return Err(BlockError::InvalidTransaction(format!(
                        "bad signature on transfer {}",
                        tx.id()
                    )));
                }
                Ok(())
            }
        }
    }

    /// Size of the binary encoding
    pub fn binary_size(&self) -> usize {
        match self {
            Transaction::Genesis(_) => GenesisTransaction::BINARY_SIZE,
            Transaction::Transfer(tx) => tx.binary_size(),
        }
    }

    pub(crate) fn write_binary(
        &self,
        buf: &mut impl BufMut,
        scheme: Scheme,
    ) -> Result<(), BlockError> {
        match self {
            Transaction::Genesis(tx) => tx.write_binary(buf, scheme),
            Transaction::Transfer(tx) => tx.write_binary(buf, scheme),
        }
    }

    /// Binary encoding
    pub fn marshal_binary(&self, scheme: Scheme) -> Result<Vec<u8>, BlockError> {
        with_buffer(|buf| -> Result<Vec<u8>, BlockError> {
            self.write_binary(buf, scheme)?;
            Ok(buf.to_vec())
        })
    }

    /// Decode a binary transaction, dispatching on its leading type byte
    pub fn unmarshal_binary(data: &[u8], scheme: Scheme) -> Result<Self, BlockError> {
        let first = *data.first().ok_or(BlockError::InvalidDataSize)?;
        let mut reader = ByteReader::new(data);
        let tx = match TransactionType::try_from(first)? {
            TransactionType::Genesis => {
                Transaction::Genesis(GenesisTransaction::read_binary(&mut reader, scheme)?)
            }
            TransactionType::Transfer => {
                Transaction::Transfer(TransferTransaction::read_binary(&mut reader, scheme)?)
            }
        };
        reader.finish()?;
        Ok(tx)
    }

    pub fn to_protobuf_signed(&self, scheme: Scheme) -> Result<pb::SignedTransaction, BlockError> {
        match self {
            Transaction::Genesis(tx) => tx.to_protobuf_signed(scheme),
            Transaction::Transfer(tx) => tx.to_protobuf_signed(scheme),
        }
    }

    /// Deterministic encoding of the signed protobuf form
    pub fn marshal_signed_to_protobuf(&self, scheme: Scheme) -> Result<Vec<u8>, BlockError> {
        let signed = self.to_protobuf_signed(scheme)?;
        with_buffer(|buf| -> Result<Vec<u8>, BlockError> {
            signed.encode(buf)?;
            Ok(buf.to_vec())
        })
    }

    pub fn from_protobuf_signed(
        signed: pb::SignedTransaction,
        scheme: Scheme,
    ) -> Result<Self, BlockError> {
        let tx = signed
            .transaction
            .ok_or_else(|| BlockError::InvalidTransaction("missing transaction body".to_string()))?;
        if tx.chain_id != i32::from(scheme) {
            return Err(BlockError::InvalidTransaction(format!(
                "chain id {} does not match scheme {}",
                tx.chain_id, scheme
            )));
        }
        match tx.data.clone() {
            Some(pb::transaction::Data::Genesis(data)) => {
                GenesisTransaction::from_protobuf(&tx, data, &signed.proofs)
                    .map(Transaction::Genesis)
            }
            Some(pb::transaction::Data::Transfer(data)) => {
                TransferTransaction::from_protobuf(&tx, data, &signed.proofs, scheme)
                    .map(Transaction::Transfer)
            }
            None => Err(BlockError::InvalidTransaction("missing transaction data".to_string())),
        }
    }

    pub fn unmarshal_signed_from_protobuf(data: &[u8], scheme: Scheme) -> Result<Self, BlockError> {
        let signed = pb::SignedTransaction::decode(data)?;
        Self::from_protobuf_signed(signed, scheme)
    }

    /// Leaf bytes committed to by the block transactions root
    pub fn merkle_bytes(&self, scheme: Scheme) -> Result<Vec<u8>, BlockError> {
        self.marshal_signed_to_protobuf(scheme)
    }

    /// Second phase of JSON decoding, once the envelope has been read
    pub fn from_json_value(
        envelope: TransactionTypeVersion,
        value: serde_json::Value,
    ) -> Result<Self, BlockError> {
        let tx = match envelope.guess()? {
            TransactionType::Genesis => Transaction::Genesis(serde_json::from_value(value)?),
            TransactionType::Transfer => Transaction::Transfer(serde_json::from_value(value)?),
        };
        if tx.version() != envelope.version {
            return Err(BlockError::InvalidTransaction(
                "version does not match envelope".to_string(),
            ));
        }
        Ok(tx)
    }
}

impl Serialize for Transaction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Tagged<'a, T> {
            #[serde(rename = "type")]
            tx_type: TransactionType,
            #[serde(flatten)]
            body: &'a T,
        }

        let tx_type = self.tx_type();
        match self {
            Transaction::Genesis(body) => Tagged { tx_type, body }.serialize(serializer),
            Transaction::Transfer(body) => Tagged { tx_type, body }.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Transaction {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        let envelope =
            TransactionTypeVersion::deserialize(&value).map_err(serde::de::Error::custom)?;
        Transaction::from_json_value(envelope, value).map_err(serde::de::Error::custom)
    }
}

impl From<GenesisTransaction> for Transaction {
    fn from(tx: GenesisTransaction) -> Self {
        Transaction::Genesis(tx)
    }
}

impl From<TransferTransaction> for Transaction {
    fn from(tx: TransferTransaction) -> Self {
        Transaction::Transfer(tx)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::address::Address;
    use crate::constants::{MAIN_NET_SCHEME, TEST_NET_SCHEME};
    use crate::crypto::SecretKey;

    pub(crate) fn signed_transfer(scheme: Scheme, amount: u64) -> Transaction {
        let sender = SecretKey::generate();
        let recipient = Address::from_public_key(scheme, &SecretKey::generate().public_key());
        let mut tx = TransferTransaction::new(
            2,
            sender.public_key(),
            recipient,
            amount,
            100_000,
            1_700_000_000_000,
            b"memo".to_vec(),
        );
        tx.sign(&sender).unwrap();
        tx.into()
    }

    pub(crate) fn genesis(scheme: Scheme, amount: u64) -> Transaction {
        let recipient = Address::from_public_key(scheme, &SecretKey::generate().public_key());
        GenesisTransaction::new(recipient, amount, 1_460_678_400_000).into()
    }

    #[test]
    fn test_binary_roundtrip_dispatches_on_type() {
        for tx in [genesis(MAIN_NET_SCHEME, 5), signed_transfer(MAIN_NET_SCHEME, 7)] {
            let bytes = tx.marshal_binary(MAIN_NET_SCHEME).unwrap();
            assert_eq!(bytes.len(), tx.binary_size());
            assert_eq!(Transaction::unmarshal_binary(&bytes, MAIN_NET_SCHEME).unwrap(), tx);
        }
    }

    #[test]
    fn test_unknown_type_byte_rejected() {
        let err = Transaction::unmarshal_binary(&[9, 0, 0], MAIN_NET_SCHEME).unwrap_err();
        assert!(matches!(err, BlockError::InvalidTransaction(_)));
        assert!(matches!(
            Transaction::unmarshal_binary(&[], MAIN_NET_SCHEME),
            Err(BlockError::InvalidDataSize)
        ));
    }

    #[test]
    fn test_protobuf_roundtrip() {
        let tx = signed_transfer(TEST_NET_SCHEME, 42);
        let bytes = tx.marshal_signed_to_protobuf(TEST_NET_SCHEME).unwrap();
        let decoded = Transaction::unmarshal_signed_from_protobuf(&bytes, TEST_NET_SCHEME).unwrap();
        assert_eq!(decoded, tx);
    }

    #[test]
    fn test_protobuf_wrong_chain_rejected() {
        let tx = genesis(TEST_NET_SCHEME, 1);
        let bytes = tx.marshal_signed_to_protobuf(TEST_NET_SCHEME).unwrap();
        assert!(Transaction::unmarshal_signed_from_protobuf(&bytes, MAIN_NET_SCHEME).is_err());
    }

    #[test]
    fn test_json_carries_type_and_version() {
        let tx = signed_transfer(MAIN_NET_SCHEME, 3);
        let value = serde_json::to_value(&tx).unwrap();
        assert_eq!(value["type"], 4);
        assert_eq!(value["version"], 2);
        let back: Transaction = serde_json::from_value(value).unwrap();
        assert_eq!(back, tx);
    }

    #[test]
    fn test_envelope_guess() {
        let ok = TransactionTypeVersion { tx_type: 4, version: 1 };
        assert_eq!(ok.guess().unwrap(), TransactionType::Transfer);
        let bad_version = TransactionTypeVersion { tx_type: 1, version: 3 };
        assert!(bad_version.guess().is_err());
        let bad_type = TransactionTypeVersion { tx_type: 77, version: 1 };
        assert!(bad_type.guess().is_err());
    }
}
