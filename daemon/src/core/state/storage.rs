//! Structured storage: variable-length byte blobs laid out over
//! fixed-width trie slots of a system account.
//!
//! The header word under `keccak(key)` packs the byte size and the
//! slot count; payload words live at
//! `keccak(minimal_be(i) ‖ minimal_be(keccak(key)))` with the bytes
//! right-aligned inside each 32-byte word. Every write bumps the
//! account nonce so stale readers can detect the change.

use super::StateDB;
use tempo_common::crypto::{keccak256, keccak256_concat, Address, Hash, HASH_SIZE};

impl StateDB {
    /// Raw slot read; absent accounts and absent slots read as zero.
    pub fn get_state(&self, addr: &Address, key: &Hash) -> Hash {
        self.account(addr)
            .and_then(|acc| acc.storage.get(key).copied())
            .unwrap_or_default()
    }

    pub fn set_state(&mut self, addr: &Address, key: Hash, value: Hash) {
        self.account_mut(addr).storage.insert(key, value);
    }

    /// Read a variable-length blob stored under `key`. An absent key
    /// yields an empty vector.
    pub fn get_struct_data(&self, addr: &Address, key: &[u8]) -> Vec<u8> {
        if key.is_empty() {
            return Vec::new();
        }
        let key_hash = keccak256(key);
        let info = self.get_state(addr, &key_hash);
        let size = read_be4(&info.as_bytes()[0..4]) as usize;
        let slots = read_be4(&info.as_bytes()[HASH_SIZE / 2..HASH_SIZE / 2 + 4]) as usize;

        let mut data = vec![0u8; size];
        for i in 0..slots {
            let start = i * HASH_SIZE;
            if start >= size {
                break;
            }
            let end = (start + HASH_SIZE).min(size);
            let word = self.get_state(addr, &payload_slot_key(i as u64, &key_hash));
            let n = end - start;
            data[start..end].copy_from_slice(&word.as_bytes()[HASH_SIZE - n..]);
        }
        data
    }

    /// Write a variable-length blob under `key`, bumping the account
    /// nonce.
    pub fn set_struct_data(&mut self, addr: &Address, key: &[u8], value: &[u8]) {
        if key.is_empty() {
            return;
        }
        let size = value.len();
        let slots = size / HASH_SIZE + usize::from(size % HASH_SIZE != 0);

        let mut info = [0u8; HASH_SIZE];
        info[0..4].copy_from_slice(&(size as u32).to_be_bytes());
        info[HASH_SIZE / 2..HASH_SIZE / 2 + 4].copy_from_slice(&(slots as u32).to_be_bytes());

        let key_hash = keccak256(key);
        self.set_state(addr, key_hash, Hash::new(info));

        for i in 0..slots {
            let start = i * HASH_SIZE;
            let end = (start + HASH_SIZE).min(size);
            let word = Hash::from_slice_padded(&value[start..end]);
            self.set_state(addr, payload_slot_key(i as u64, &key_hash), word);
        }

        let account = self.account_mut(addr);
        account.nonce += 1;
    }

    // ----- whole-account data blob (ticket storage) -----

    pub fn set_data(&mut self, addr: &Address, value: Vec<u8>) -> Hash {
        let hash = keccak256(&value);
        let account = self.account_mut(addr);
        account.data = value;
        account.data_hash = hash;
        hash
    }

    pub fn get_data(&self, addr: &Address) -> Vec<u8> {
        self.account(addr)
            .map(|acc| acc.data.clone())
            .unwrap_or_default()
    }

    pub fn get_data_hash(&self, addr: &Address) -> Hash {
        self.account(addr)
            .map(|acc| acc.data_hash)
            .unwrap_or_default()
    }
}

fn read_be4(bytes: &[u8]) -> u32 {
    u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

fn payload_slot_key(index: u64, key_hash: &Hash) -> Hash {
    let index_bytes = index.to_be_bytes();
    let index_min = strip_leading_zeros(&index_bytes);
    let key_min = strip_leading_zeros(key_hash.as_bytes());
    keccak256_concat(&[index_min, key_min])
}

// big.Int style minimal big-endian form: zero encodes as empty
fn strip_leading_zeros(bytes: &[u8]) -> &[u8] {
    let first = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    &bytes[first..]
}
