//! Ordered transaction list of a block

use bytes::BufMut;
use prost::Message;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::io::Write;
use std::ops::Deref;

use super::{Transaction, TransactionTypeVersion};
use crate::codec::{with_buffer, ByteReader};
use crate::error::BlockError;
use crate::protobuf as pb;
use crate::Scheme;

/// Size of the length prefix in front of every encoded transaction
const LENGTH_PREFIX_SIZE: usize = 4;

/// Transactions in block order. Order is significant for both the binary
/// layout and the transactions root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transactions(Vec<Transaction>);

impl Transactions {
    pub fn new(transactions: Vec<Transaction>) -> Self {
        Self(transactions)
    }

    /// Decode `count` length-prefixed binary transactions from the start of `data`
    pub fn from_binary(data: &[u8], count: usize, scheme: Scheme) -> Result<Self, BlockError> {
        let mut reader = ByteReader::new(data);
        // each entry takes at least its length prefix
        let mut transactions = Vec::with_capacity(count.min(data.len() / LENGTH_PREFIX_SIZE));
        for _ in 0..count {
            let size = reader.read_u32()? as usize;
            let tx_bytes = reader.take(size)?;
            transactions.push(Transaction::unmarshal_binary(tx_bytes, scheme)?);
        }
        Ok(Self(transactions))
    }

    pub fn count(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn push(&mut self, tx: Transaction) {
        self.0.push(tx);
    }

    pub fn into_inner(self) -> Vec<Transaction> {
        self.0
    }

    /// Size of the binary form, length prefixes included
    pub fn binary_size(&self) -> usize {
        self.0.iter().map(|tx| LENGTH_PREFIX_SIZE + tx.binary_size()).sum()
    }

    pub(crate) fn put_binary(
        &self,
        buf: &mut impl BufMut,
        scheme: Scheme,
    ) -> Result<(), BlockError> {
        for tx in &self.0 {
            buf.put_u32(length_prefix(tx.binary_size())?);
            tx.write_binary(buf, scheme)?;
        }
        Ok(())
    }

    pub fn marshal_binary(&self, scheme: Scheme) -> Result<Vec<u8>, BlockError> {
        with_buffer(|buf| -> Result<Vec<u8>, BlockError> {
            self.put_binary(buf, scheme)?;
            Ok(buf.to_vec())
        })
    }

    /// Write `[len][binary tx]` entries, returning the number of bytes written
    pub fn write_to_binary<W: Write>(
        &self,
        w: &mut W,
        scheme: Scheme,
    ) -> Result<usize, BlockError> {
        let bytes = self.marshal_binary(scheme)?;
        w.write_all(&bytes)?;
        Ok(bytes.len())
    }

    /// Write either binary or signed-protobuf entries, each behind a length prefix
    pub fn write_to<W: Write>(
        &self,
        proto: bool,
        scheme: Scheme,
        w: &mut W,
    ) -> Result<usize, BlockError> {
        if !proto {
            return self.write_to_binary(w, scheme);
        }
        let mut written = 0;
        for tx in &self.0 {
            let bytes = tx.marshal_signed_to_protobuf(scheme)?;
            w.write_all(&length_prefix(bytes.len())?.to_be_bytes())?;
            w.write_all(&bytes)?;
            written += LENGTH_PREFIX_SIZE + bytes.len();
        }
        Ok(written)
    }

    /// Read back what `write_to(true, ..)` produced
    pub fn unmarshal_from_protobuf(data: &[u8], scheme: Scheme) -> Result<Self, BlockError> {
        let mut reader = ByteReader::new(data);
        let mut transactions = Vec::new();
        while !reader.is_empty() {
            let size = reader.read_u32()? as usize;
            let signed = pb::SignedTransaction::decode(reader.take(size)?)?;
            transactions.push(Transaction::from_protobuf_signed(signed, scheme)?);
        }
        Ok(Self(transactions))
    }

    pub fn to_protobuf(&self, scheme: Scheme) -> Result<Vec<pb::SignedTransaction>, BlockError> {
        self.0.iter().map(|tx| tx.to_protobuf_signed(scheme)).collect()
    }

    pub fn from_protobuf(
        signed: Vec<pb::SignedTransaction>,
        scheme: Scheme,
    ) -> Result<Self, BlockError> {
        signed
            .into_iter()
            .map(|tx| Transaction::from_protobuf_signed(tx, scheme))
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }

    /// Concatenate, `self` first
    pub fn join(&self, other: &Transactions) -> Transactions {
        let mut joined = Vec::with_capacity(self.count() + other.count());
        joined.extend_from_slice(&self.0);
        joined.extend_from_slice(&other.0);
        Self(joined)
    }
}

fn length_prefix(len: usize) -> Result<u32, BlockError> {
    u32::try_from(len).map_err(|_| {
        BlockError::InvalidTransaction(format!("transaction of {} bytes is too large", len))
    })
}

impl Deref for Transactions {
    type Target = [Transaction];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<Transaction>> for Transactions {
    fn from(transactions: Vec<Transaction>) -> Self {
        Self(transactions)
    }
}

impl FromIterator<Transaction> for Transactions {
    fn from_iter<I: IntoIterator<Item = Transaction>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Transactions {
    type Item = Transaction;
    type IntoIter = std::vec::IntoIter<Transaction>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Transactions {
    type Item = &'a Transaction;
    type IntoIter = std::slice::Iter<'a, Transaction>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl Serialize for Transactions {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Transactions {
    /// Two passes: read every element's `{type, version}` envelope, then
    /// decode each element into the variant its envelope names.
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let values = Vec::<serde_json::Value>::deserialize(deserializer)?;
        let envelopes = values
            .iter()
            .map(|value| TransactionTypeVersion::deserialize(value))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| serde::de::Error::custom(format!("transaction type: {}", e)))?;
        envelopes
            .into_iter()
            .zip(values)
            .map(|(envelope, value)| Transaction::from_json_value(envelope, value))
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
            .map_err(serde::de::Error::custom)
    }
}
