//! Genesis transaction - initial coin allocation, unsigned

use bytes::BufMut;
use serde::{Deserialize, Serialize};

use super::TransactionType;
use crate::address::{Address, ADDRESS_SIZE};
use crate::codec::ByteReader;
use crate::crypto::{fast_hash, Digest};
use crate::error::BlockError;
use crate::protobuf as pb;
use crate::Scheme;

/// Initial allocation of coins to an address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenesisTransaction {
    pub version: u8,
    pub timestamp: u64,
    pub recipient: Address,
    pub amount: u64,
}

impl GenesisTransaction {
    pub const VERSION: u8 = 1;

    /// type + timestamp + recipient + amount
    pub const BINARY_SIZE: usize = 1 + 8 + ADDRESS_SIZE + 8;

    pub fn new(recipient: Address, amount: u64, timestamp: u64) -> Self {
        Self {
            version: Self::VERSION,
            timestamp,
            recipient,
            amount,
        }
    }

    /// Genesis transactions are unsigned; the ID covers the whole encoding
    pub fn id(&self) -> Digest {
        let mut bytes = Vec::with_capacity(Self::BINARY_SIZE);
        self.put_fields(&mut bytes);
        fast_hash(&bytes)
    }

    pub(crate) fn validate(&self, scheme: Scheme) -> Result<(), BlockError> {
        if self.version != Self::VERSION {
            return Err(BlockError::InvalidTransaction(format!(
                "unsupported genesis version {}",
                self.version
            )));
        }
        if self.recipient.scheme() != scheme {
            return Err(BlockError::InvalidTransaction(
                "recipient belongs to another chain".to_string(),
            ));
        }
        Ok(())
    }

    fn put_fields(&self, buf: &mut impl BufMut) {
        buf.put_u8(TransactionType::Genesis as u8);
        buf.put_u64(self.timestamp);
        buf.put_slice(self.recipient.as_bytes());
        buf.put_u64(self.amount);
    }

    pub(crate) fn write_binary(
        &self,
        buf: &mut impl BufMut,
        scheme: Scheme,
    ) -> Result<(), BlockError> {
        self.validate(scheme)?;
        self.put_fields(buf);
        Ok(())
    }

    pub(crate) fn read_binary(
        reader: &mut ByteReader<'_>,
        scheme: Scheme,
    ) -> Result<Self, BlockError> {
        if reader.read_u8()? != TransactionType::Genesis as u8 {
            return Err(BlockError::InvalidTransaction("not a genesis transaction".to_string()));
        }
        let timestamp = reader.read_u64()?;
        let recipient = Address::from_bytes(reader.take(ADDRESS_SIZE)?)?;
        let amount = reader.read_u64()?;
        let tx = Self::new(recipient, amount, timestamp);
        tx.validate(scheme)?;
        Ok(tx)
    }

    pub(crate) fn to_protobuf_signed(
        &self,
        scheme: Scheme,
    ) -> Result<pb::SignedTransaction, BlockError> {
        self.validate(scheme)?;
        Ok(pb::SignedTransaction {
            transaction: Some(pb::Transaction {
                chain_id: i32::from(scheme),
                sender_public_key: Vec::new(),
                fee: 0,
                timestamp: self.timestamp as i64,
                version: i32::from(self.version),
                data: Some(pb::transaction::Data::Genesis(pb::GenesisTransactionData {
                    recipient_address: self.recipient.as_bytes().to_vec(),
                    amount: self.amount as i64,
                })),
            }),
            proofs: Vec::new(),
        })
    }

    pub(crate) fn from_protobuf(
        tx: &pb::Transaction,
        data: pb::GenesisTransactionData,
        proofs: &[Vec<u8>],
    ) -> Result<Self, BlockError> {
        if tx.version != i32::from(Self::VERSION) {
            return Err(BlockError::InvalidTransaction(format!(
                "unsupported genesis version {}",
                tx.version
            )));
        }
        if !proofs.is_empty() || !tx.sender_public_key.is_empty() || tx.fee != 0 {
            return Err(BlockError::InvalidTransaction(
                "genesis transaction must not carry a sender".to_string(),
            ));
        }
        let recipient = Address::from_bytes(&data.recipient_address)?;
        Ok(Self::new(recipient, data.amount as u64, tx.timestamp as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{MAIN_NET_SCHEME, TEST_NET_SCHEME};
    use crate::crypto::SecretKey;
    use crate::transaction::Transaction;

    fn sample(scheme: Scheme) -> GenesisTransaction {
        let recipient = Address::from_public_key(scheme, &SecretKey::generate().public_key());
        GenesisTransaction::new(recipient, 10_000_000_000, 1_460_678_400_000)
    }

    #[test]
    fn test_binary_layout() {
        let tx = sample(MAIN_NET_SCHEME);
        let bytes = Transaction::from(tx.clone()).marshal_binary(MAIN_NET_SCHEME).unwrap();
        assert_eq!(bytes.len(), GenesisTransaction::BINARY_SIZE);
        assert_eq!(bytes[0], 1);
        assert_eq!(&bytes[1..9], &1_460_678_400_000u64.to_be_bytes());
        assert_eq!(&bytes[9..35], tx.recipient.as_bytes());
        assert_eq!(&bytes[35..], &10_000_000_000u64.to_be_bytes());
    }

    #[test]
    fn test_foreign_recipient_rejected() {
        let tx = Transaction::from(sample(TEST_NET_SCHEME));
        assert!(tx.marshal_binary(MAIN_NET_SCHEME).is_err());
    }

    #[test]
    fn test_id_is_deterministic() {
        let tx = sample(MAIN_NET_SCHEME);
        assert_eq!(tx.id(), tx.clone().id());
    }
}
