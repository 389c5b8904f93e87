//! Generator reward shares reported alongside a block

use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::protobuf as pb;

/// Reward paid to one address for a block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardShare {
    pub address: Address,
    pub amount: u64,
}

impl RewardShare {
    pub fn new(address: Address, amount: u64) -> Self {
        Self { address, amount }
    }
}

/// Reward shares of a block in no particular order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rewards(Vec<RewardShare>);

impl Rewards {
    pub fn new(shares: Vec<RewardShare>) -> Self {
        Self(shares)
    }

    pub fn shares(&self) -> &[RewardShare] {
        &self.0
    }

    /// Shares ordered by address bytes, the order they are reported in
    pub fn sorted(&self) -> Vec<RewardShare> {
        let mut shares = self.0.clone();
        shares.sort_by(|a, b| a.address.as_bytes().cmp(b.address.as_bytes()));
        shares
    }

    pub(crate) fn to_protobuf(&self) -> Vec<pb::RewardShare> {
        self.sorted()
            .into_iter()
            .map(|share| pb::RewardShare {
                address: share.address.as_bytes().to_vec(),
                reward: share.amount as i64,
            })
            .collect()
    }
}

impl From<Vec<RewardShare>> for Rewards {
    fn from(shares: Vec<RewardShare>) -> Self {
        Self(shares)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::MAIN_NET_SCHEME;
    use crate::crypto::SecretKey;

    #[test]
    fn test_protobuf_shares_sorted_by_address() {
        let addresses: Vec<Address> = (0..5)
            .map(|_| Address::from_public_key(MAIN_NET_SCHEME, &SecretKey::generate().public_key()))
            .collect();
        let rewards: Rewards = addresses
            .iter()
            .enumerate()
            .map(|(i, a)| RewardShare::new(*a, i as u64))
            .collect::<Vec<_>>()
            .into();

        let encoded = rewards.to_protobuf();
        assert_eq!(encoded.len(), 5);
        for pair in encoded.windows(2) {
            assert!(pair[0].address <= pair[1].address);
        }
        // sorting leaves the source untouched
        assert_eq!(rewards.shares()[0].address, addresses[0]);
    }
}
