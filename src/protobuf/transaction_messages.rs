//! Transaction messages

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SignedTransaction {
    #[prost(message, optional, tag = "1")]
    pub transaction: ::core::option::Option<Transaction>,
    #[prost(bytes = "vec", repeated, tag = "2")]
    pub proofs: ::prost::alloc::vec::Vec<::prost::alloc::vec::Vec<u8>>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Transaction {
    #[prost(int32, tag = "1")]
    pub chain_id: i32,
    #[prost(bytes = "vec", tag = "2")]
    pub sender_public_key: ::prost::alloc::vec::Vec<u8>,
    #[prost(int64, tag = "3")]
    pub fee: i64,
    #[prost(int64, tag = "4")]
    pub timestamp: i64,
    #[prost(int32, tag = "5")]
    pub version: i32,
    #[prost(oneof = "transaction::Data", tags = "101, 104")]
    pub data: ::core::option::Option<transaction::Data>,
}

pub mod transaction {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Data {
        #[prost(message, tag = "101")]
        Genesis(super::GenesisTransactionData),
        #[prost(message, tag = "104")]
        Transfer(super::TransferTransactionData),
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GenesisTransactionData {
    #[prost(bytes = "vec", tag = "1")]
    pub recipient_address: ::prost::alloc::vec::Vec<u8>,
    #[prost(int64, tag = "2")]
    pub amount: i64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TransferTransactionData {
    #[prost(bytes = "vec", tag = "1")]
    pub recipient: ::prost::alloc::vec::Vec<u8>,
    #[prost(int64, tag = "2")]
    pub amount: i64,
    #[prost(bytes = "vec", tag = "3")]
    pub attachment: ::prost::alloc::vec::Vec<u8>,
}
