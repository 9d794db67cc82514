//! Deterministic instance placement.
//!
//! `final_salt = sha256(raw_salt ‖ creator)`, and the instance address is the
//! PDA `["instance", final_salt, sha256(code)]` of this program. Creation and
//! prediction both go through [`derive_address`].

use solana_program::{hash::hashv, pubkey::Pubkey};

use crate::{
    constants::{
        PROXY_IMAGE_LEN, PROXY_MAGIC, PROXY_VERSION, SEED_AUTHOR, SEED_BINDING, SEED_BLUEPRINT, SEED_CATEGORY,
        SEED_CREATOR, SEED_DEPLOYED, SEED_HASH, SEED_INSTANCE, SEED_LEDGER, SEED_RECORD,
    },
    state::{Category, Hash32},
};

/// Mixes the creator into the raw salt so different creators never share a placement.
pub fn combine_salt(raw_salt: &Hash32, creator: &Pubkey) -> Hash32 {
    hashv(&[&raw_salt[..], creator.as_ref()]).to_bytes()
}

pub fn code_hash(code: &[u8]) -> Hash32 {
    hashv(&[code]).to_bytes()
}

/// The fixed minimal-proxy image bound to `implementation`.
pub fn proxy_image(implementation: &Pubkey) -> Vec<u8> {
    let mut image = Vec::with_capacity(PROXY_IMAGE_LEN);
    image.extend_from_slice(PROXY_MAGIC);
    image.push(PROXY_VERSION);
    image.extend_from_slice(&[0u8; 3]);
    image.extend_from_slice(implementation.as_ref());
    image
}

pub fn proxy_code_hash(implementation: &Pubkey) -> Hash32 {
    code_hash(&proxy_image(implementation))
}

pub fn instance_seeds<'a>(final_salt: &'a Hash32, code_hash: &'a Hash32) -> [&'a [u8]; 3] {
    [SEED_INSTANCE, &final_salt[..], &code_hash[..]]
}

pub fn derive_address(program_id: &Pubkey, final_salt: &Hash32, code_hash: &Hash32) -> (Pubkey, u8) {
    Pubkey::find_program_address(&instance_seeds(final_salt, code_hash), program_id)
}

/// Address an instance of `payload_hash` would land at under an already combined salt.
pub fn predict_address(program_id: &Pubkey, final_salt: &Hash32, payload_hash: &Hash32) -> Pubkey {
    derive_address(program_id, final_salt, payload_hash).0
}

/// Same as [`predict_address`] but starting from the creator's raw salt.
pub fn predict_for(
    program_id: &Pubkey,
    creator: &Pubkey,
    raw_salt: &Hash32,
    payload_hash: &Hash32,
) -> Pubkey {
    predict_address(program_id, &combine_salt(raw_salt, creator), payload_hash)
}

/// An account holding one registry or factory record, or one index list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKey<'a> {
    Blueprint(u64),
    Hash(&'a Hash32),
    Category(Category),
    Author(&'a Pubkey),
    Binding(u64),
    Instance(&'a Pubkey),
    Creator(&'a Pubkey),
    Deployed(u64),
    Ledger,
}

impl RecordKey<'_> {
    pub fn seeds(&self) -> Vec<Vec<u8>> {
        let (prefix, key): (&[u8], Vec<u8>) = match *self {
            RecordKey::Ledger => return vec![SEED_LEDGER.to_vec()],
            RecordKey::Blueprint(id) => (SEED_BLUEPRINT, id.to_le_bytes().to_vec()),
            RecordKey::Hash(hash) => (SEED_HASH, hash.to_vec()),
            RecordKey::Category(category) => (SEED_CATEGORY, vec![category as u8]),
            RecordKey::Author(author) => (SEED_AUTHOR, author.to_bytes().to_vec()),
            RecordKey::Binding(id) => (SEED_BINDING, id.to_le_bytes().to_vec()),
            RecordKey::Instance(address) => (SEED_RECORD, address.to_bytes().to_vec()),
            RecordKey::Creator(creator) => (SEED_CREATOR, creator.to_bytes().to_vec()),
            RecordKey::Deployed(id) => (SEED_DEPLOYED, id.to_le_bytes().to_vec()),
        };
        vec![prefix.to_vec(), key]
    }

    pub fn find(&self, program_id: &Pubkey) -> (Pubkey, u8) {
        let seeds = self.seeds();
        let seeds: Vec<&[u8]> = seeds.iter().map(Vec::as_slice).collect();
        Pubkey::find_program_address(&seeds, program_id)
    }

    pub fn address(&self, program_id: &Pubkey) -> Pubkey {
        self.find(program_id).0
    }
}
