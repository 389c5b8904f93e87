//! Block messages

use super::SignedTransaction;

/// A protobuf block: header, header signature and transactions
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Block {
    #[prost(message, optional, tag = "1")]
    pub header: ::core::option::Option<block::Header>,
    #[prost(bytes = "vec", tag = "2")]
    pub signature: ::prost::alloc::vec::Vec<u8>,
    #[prost(message, repeated, tag = "3")]
    pub transactions: ::prost::alloc::vec::Vec<SignedTransaction>,
}

pub mod block {
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Header {
        #[prost(int32, tag = "1")]
        pub chain_id: i32,
        /// ID of the parent block
        #[prost(bytes = "vec", tag = "2")]
        pub reference: ::prost::alloc::vec::Vec<u8>,
        #[prost(int64, tag = "3")]
        pub base_target: i64,
        #[prost(bytes = "vec", tag = "4")]
        pub generation_signature: ::prost::alloc::vec::Vec<u8>,
        #[prost(uint32, repeated, tag = "5")]
        pub feature_votes: ::prost::alloc::vec::Vec<u32>,
        #[prost(int64, tag = "6")]
        pub timestamp: i64,
        #[prost(int32, tag = "7")]
        pub version: i32,
        #[prost(bytes = "vec", tag = "8")]
        pub generator: ::prost::alloc::vec::Vec<u8>,
        #[prost(int64, tag = "9")]
        pub reward_vote: i64,
        #[prost(bytes = "vec", tag = "10")]
        pub transactions_root: ::prost::alloc::vec::Vec<u8>,
        /// Empty when the block carries no state hash
        #[prost(bytes = "vec", tag = "11")]
        pub state_hash: ::prost::alloc::vec::Vec<u8>,
        #[prost(message, optional, tag = "12")]
        pub challenged_header: ::core::option::Option<header::ChallengedHeader>,
    }

    pub mod header {
        /// Header as proposed by the challenged generator
        #[derive(Clone, PartialEq, ::prost::Message)]
        pub struct ChallengedHeader {
            #[prost(int64, tag = "1")]
            pub base_target: i64,
            #[prost(bytes = "vec", tag = "2")]
            pub generation_signature: ::prost::alloc::vec::Vec<u8>,
            #[prost(uint32, repeated, tag = "3")]
            pub feature_votes: ::prost::alloc::vec::Vec<u32>,
            #[prost(int64, tag = "4")]
            pub timestamp: i64,
            #[prost(bytes = "vec", tag = "5")]
            pub generator: ::prost::alloc::vec::Vec<u8>,
            #[prost(int64, tag = "6")]
            pub reward_vote: i64,
            #[prost(bytes = "vec", tag = "7")]
            pub state_hash: ::prost::alloc::vec::Vec<u8>,
            #[prost(bytes = "vec", tag = "8")]
            pub header_signature: ::prost::alloc::vec::Vec<u8>,
        }
    }
}

/// Block annotated with chain position, as served to API clients
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct BlockWithHeight {
    #[prost(message, optional, tag = "1")]
    pub block: ::core::option::Option<Block>,
    #[prost(uint32, tag = "2")]
    pub height: u32,
    #[prost(bytes = "vec", tag = "3")]
    pub vrf: ::prost::alloc::vec::Vec<u8>,
    #[prost(message, repeated, tag = "4")]
    pub reward_shares: ::prost::alloc::vec::Vec<RewardShare>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RewardShare {
    #[prost(bytes = "vec", tag = "1")]
    pub address: ::prost::alloc::vec::Vec<u8>,
    #[prost(int64, tag = "2")]
    pub reward: i64,
}
