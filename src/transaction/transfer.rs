//! Transfer transaction - moves coins between accounts

use bytes::BufMut;
use serde::{Deserialize, Serialize};

use super::TransactionType;
use crate::address::{Address, ADDRESS_SIZE};
use crate::codec::{base58, ByteReader};
use crate::constants::{MAX_ATTACHMENT_SIZE, PUBLIC_KEY_SIZE, SIGNATURE_SIZE};
use crate::crypto::{self, fast_hash, CryptoError, Digest, PublicKey, SecretKey, Signature};
use crate::error::BlockError;
use crate::protobuf as pb;
use crate::Scheme;

/// Signed transfer of `amount` from the sender to `recipient`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferTransaction {
    pub version: u8,
    pub sender_public_key: PublicKey,
    pub recipient: Address,
    pub amount: u64,
    pub fee: u64,
    pub timestamp: u64,
    #[serde(with = "base58::vec", default, skip_serializing_if = "Vec::is_empty")]
    pub attachment: Vec<u8>,
    pub signature: Signature,
}

impl TransferTransaction {
    pub const VERSIONS: [u8; 2] = [1, 2];

    /// Fixed part of the body: type, version, sender, timestamp, amount, fee, recipient and
    /// attachment length
    const FIXED_BODY_SIZE: usize = 1 + 1 + PUBLIC_KEY_SIZE + 8 + 8 + 8 + ADDRESS_SIZE + 2;

    /// Create an unsigned transfer
    pub fn new(
        version: u8,
        sender_public_key: PublicKey,
        recipient: Address,
        amount: u64,
        fee: u64,
        timestamp: u64,
        attachment: Vec<u8>,
    ) -> Self {
        Self {
            version,
            sender_public_key,
            recipient,
            amount,
            fee,
            timestamp,
            attachment,
            signature: Signature::default(),
        }
    }

    pub fn binary_size(&self) -> usize {
        Self::FIXED_BODY_SIZE + self.attachment.len() + SIGNATURE_SIZE
    }

    /// Signed payload
    pub fn body_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(Self::FIXED_BODY_SIZE + self.attachment.len());
        self.put_body(&mut buf);
        buf
    }

    pub fn id(&self) -> Digest {
        fast_hash(&self.body_bytes())
    }

    pub fn sign(&mut self, secret: &SecretKey) -> Result<(), CryptoError> {
        self.signature = crypto::sign(secret, &self.body_bytes())?;
        Ok(())
    }

    pub fn verify(&self) -> bool {
        crypto::verify(&self.sender_public_key, &self.signature, &self.body_bytes())
    }

    pub(crate) fn validate(&self, scheme: Scheme) -> Result<(), BlockError> {
        if !Self::VERSIONS.contains(&self.version) {
            return Err(BlockError::InvalidTransaction(format!(
                "unsupported transfer version {}",
                self.version
            )));
        }
        if self.attachment.len() > MAX_ATTACHMENT_SIZE {
            return Err(BlockError::InvalidTransaction(format!(
                "attachment of {} bytes exceeds {}",
                self.attachment.len(),
                MAX_ATTACHMENT_SIZE
            )));
        }
        if self.recipient.scheme() != scheme {
            return Err(BlockError::InvalidTransaction(
                "recipient belongs to another chain".to_string(),
            ));
        }
        Ok(())
    }

    fn put_body(&self, buf: &mut impl BufMut) {
        buf.put_u8(TransactionType::Transfer as u8);
        buf.put_u8(self.version);
        buf.put_slice(self.sender_public_key.as_bytes());
        buf.put_u64(self.timestamp);
        buf.put_u64(self.amount);
        buf.put_u64(self.fee);
        buf.put_slice(self.recipient.as_bytes());
        // validate() bounds the attachment well below u16::MAX
        buf.put_u16(self.attachment.len() as u16);
        buf.put_slice(&self.attachment);
    }

    pub(crate) fn write_binary(
        &self,
        buf: &mut impl BufMut,
        scheme: Scheme,
    ) -> Result<(), BlockError> {
        self.validate(scheme)?;
        self.put_body(buf);
        buf.put_slice(self.signature.as_bytes());
        Ok(())
    }

    pub(crate) fn read_binary(
        reader: &mut ByteReader<'_>,
        scheme: Scheme,
    ) -> Result<Self, BlockError> {
        if reader.read_u8()? != TransactionType::Transfer as u8 {
            return Err(BlockError::InvalidTransaction("not a transfer transaction".to_string()));
        }
        let version = reader.read_u8()?;
        let sender_public_key = PublicKey(reader.read_array()?);
        let timestamp = reader.read_u64()?;
        let amount = reader.read_u64()?;
        let fee = reader.read_u64()?;
        let recipient = Address::from_bytes(reader.take(ADDRESS_SIZE)?)?;
        let attachment_len = reader.read_u16()? as usize;
        let attachment = reader.take(attachment_len)?.to_vec();
        let signature = Signature(reader.read_array()?);
        let tx = Self {
            version,
            sender_public_key,
            recipient,
            amount,
            fee,
            timestamp,
            attachment,
            signature,
        };
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
                sender_public_key: self.sender_public_key.as_bytes().to_vec(),
                fee: self.fee as i64,
                timestamp: self.timestamp as i64,
                version: i32::from(self.version),
                data: Some(pb::transaction::Data::Transfer(pb::TransferTransactionData {
                    recipient: self.recipient.as_bytes().to_vec(),
                    amount: self.amount as i64,
                    attachment: self.attachment.clone(),
                })),
            }),
            proofs: vec![self.signature.as_bytes().to_vec()],
        })
    }

    pub(crate) fn from_protobuf(
        tx: &pb::Transaction,
        data: pb::TransferTransactionData,
        proofs: &[Vec<u8>],
        scheme: Scheme,
    ) -> Result<Self, BlockError> {
        let version = u8::try_from(tx.version)
            .map_err(|_| {
                BlockError::InvalidTransaction(format!("invalid version {}", tx.version))
            })?;
        let sender_public_key = PublicKey(tx.sender_public_key.as_slice().try_into().map_err(
            |_| BlockError::InvalidTransaction("invalid sender public key length".to_string()),
        )?);
        let signature = match proofs {
            [proof] => Signature::from_slice(proof)?,
            _ => {
                return Err(BlockError::InvalidTransaction(format!(
                    "expected one proof, got {}",
                    proofs.len()
                )))
            }
        };
        let transfer = Self {
            version,
            sender_public_key,
            recipient: Address::from_bytes(&data.recipient)?,
            amount: data.amount as u64,
            fee: tx.fee as u64,
            timestamp: tx.timestamp as u64,
            attachment: data.attachment,
            signature,
        };
        transfer.validate(scheme)?;
        Ok(transfer)
    }
}
