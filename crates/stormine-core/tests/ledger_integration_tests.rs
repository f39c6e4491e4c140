//! Ledger behaviour as seen by storage clients: put / get / remove, value
//! replacement and the decaying price of new slots.

mod common;

#[cfg(test)]
mod ledger_integration_tests {
    use super::common::*;
    use primitive_types::{H160, U256};
    use stormine_core::*;
    use stormine_economics::Q128_ONE;

    fn ledger(config: StorageConfig) -> StorageLedger {
        StorageLedger::new(config, MemoryBlobStore::new(), Box::new(MaskRelation)).unwrap()
    }

    #[test]
    fn test_end_to_end_put_get_remove() {
        let mut config = small_config();
        config.max_kv_size_bits = 10;
        config.shard_size_bits = 20;
        let mut kv = ledger(config);
        let ctx = BlockContext::new(1, 0);

        kv.put(&ctx, client(), key(1), vec![0x11, 0x22, 0x33, 0x44], U256::zero()).unwrap();
        assert_eq!(kv.get(client(), &key(1), 0, 0, 4), vec![0x11, 0x22, 0x33, 0x44]);
        assert_eq!(kv.get(client(), &key(1), 0, 1, 2), vec![0x22, 0x33]);

        kv.remove(&ctx, client(), key(1)).unwrap();
        assert!(!kv.exist(client(), &key(1)));
        assert!(kv.get(client(), &key(1), 0, 0, 4).is_empty());
    }

    #[test]
    fn test_replacement_overwrites_whole_value() {
        let mut kv = ledger(small_config());
        let ctx = BlockContext::new(1, 0);
        kv.put(&ctx, client(), key(1), vec![0x11, 0x22, 0x33, 0x44], U256::zero()).unwrap();
        kv.put(&ctx, client(), key(1), vec![0x77, 0x22, 0x33, 0x44, 0x55, 0x66], U256::zero())
            .unwrap();
        assert_eq!(kv.get(client(), &key(1), 0, 0, 4), vec![0x77, 0x22, 0x33, 0x44]);
        assert_eq!(kv.get(client(), &key(1), 0, 0, 6), vec![0x77, 0x22, 0x33, 0x44, 0x55, 0x66]);
    }

    #[test]
    fn test_storage_price_decays() {
        let mut config = small_config();
        config.storage_cost = U256::exp10(18);
        config.dcf_factor = Q128_ONE >> 1;
        let kv = ledger(config);

        assert_eq!(kv.upfront_payment(0), U256::exp10(18));
        assert_eq!(kv.upfront_payment(1), U256::exp10(18) / 2);
        assert_eq!(kv.upfront_payment(4), U256::from(62_500_000_000_000_000u64));
    }

    #[test]
    fn test_yearly_discount_price() {
        let mut config = small_config();
        config.storage_cost = U256::exp10(18);
        config.dcf_factor = U256::from_dec_str("340282365784068676928457747575078800565").unwrap();
        let kv = ledger(config);

        assert_eq!(kv.upfront_payment(1), U256::from(999_999_996_659_039_970u64));
        assert_eq!(
            kv.upfront_payment(365 * 24 * 3600),
            U256::from(900_000_000_000_000_000u64)
        );
    }

    #[test]
    fn test_remove_to_pays_recipient() {
        let mut config = small_config();
        config.storage_cost = U256::exp10(18);
        config.dcf_factor = Q128_ONE >> 1;
        let mut kv = ledger(config);

        kv.put(&BlockContext::new(1, 0), client(), key(1), vec![1, 2, 3], U256::exp10(18))
            .unwrap();
        let recipient = H160::from_low_u64_be(0x1234);
        kv.remove_to(&BlockContext::new(2, 4), client(), key(1), recipient).unwrap();
        assert_eq!(
            kv.balance_of(&recipient),
            U256::from(62_500_000_000_000_000u64)
        );
        assert!(matches!(
            kv.events().last(),
            Some(StorageEvent::Remove { kv_idx: 0, .. })
        ));
    }

    #[test]
    fn test_many_keys_fill_shards_in_order() {
        let mut kv = ledger(small_config());
        for n in 0..5u64 {
            let idx = kv
                .put(&BlockContext::new(n, n), client(), key(n), labelled_blob(n as u32), U256::zero())
                .unwrap();
            assert_eq!(idx, n);
        }
        // two slots per shard: shards 0, 1, 2 are in use
        assert_eq!(kv.shard_count(), 3);
        assert_eq!(kv.address_space().shard_of(4), 2);
        assert_eq!(kv.hash(client(), &key(3)), stormine_crypto::merkle_root_min_tree(&labelled_blob(3)));
        assert_eq!(version(), env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_owners_keep_separate_namespaces() {
        let mut kv = ledger(small_config());
        let ctx = BlockContext::new(1, 0);
        let alice = H160::from_low_u64_be(0xa);
        let bob = H160::from_low_u64_be(0xb);

        for n in 0..10u64 {
            kv.put(&ctx, alice, key(n), vec![n as u8; 3], U256::zero()).unwrap();
        }
        for n in 0..5u64 {
            kv.put(&ctx, bob, key(n), vec![0x80 | n as u8; 5], U256::zero())
                .unwrap();
        }
        assert_eq!(kv.kv_entry_count(), 15);
        assert_eq!(kv.get(alice, &key(2), 0, 0, 3), vec![2, 2, 2]);
        assert_eq!(kv.get(bob, &key(2), 0, 0, 5), vec![0x82; 5]);
        assert_eq!(kv.size(alice, &key(4)), 3);
        assert_eq!(kv.size(bob, &key(4)), 5);

        kv.remove(&ctx, bob, key(0)).unwrap();
        kv.remove(&ctx, bob, key(2)).unwrap();
        assert!(!kv.exist(bob, &key(0)));
        assert!(!kv.exist(bob, &key(2)));
        assert_eq!(kv.get(alice, &key(0), 0, 0, 3), vec![0, 0, 0]);
        assert_eq!(kv.get(alice, &key(2), 0, 0, 3), vec![2, 2, 2]);
        assert_eq!(kv.get(bob, &key(1), 0, 0, 5), vec![0x81; 5]);
        assert_eq!(kv.kv_entry_count(), 13);

        assert_eq!(
            kv.remove(&ctx, bob, key(7)),
            Err(StorageError::NotFound(key(7)))
        );
        assert!(kv.exist(alice, &key(7)));
    }
}
