//! Full mining rounds against stored data: an honest miner walks the hash
//! chain, reads and masks its samples and submits them.

mod common;

#[cfg(test)]
mod mining_integration_tests {
    use super::common::*;
    use primitive_types::{H160, H256, U256};
    use rlp::RlpStream;
    use stormine_core::randao::MIX_HASH_INDEX;
    use stormine_core::*;
    use stormine_crypto::keccak256;
    use stormine_economics::Q128_ONE;

    fn miner() -> H160 {
        H160::from_low_u64_be(0xa11ce)
    }

    fn stocked_ledger(config: StorageConfig) -> StorageLedger {
        let mut ledger = StorageLedger::new(config, MemoryBlobStore::new(), Box::new(MaskRelation)).unwrap();
        let ctx = BlockContext::new(1, 0);
        ledger
            .put_batch(
                &ctx,
                client(),
                vec![key(1), key(2), key(3)],
                vec![labelled_blob(1), labelled_blob(2), labelled_blob(3)[..1000].to_vec()],
                U256::zero(),
            )
            .unwrap();
        ledger
    }

    fn header_with_mix(mix: H256) -> Vec<u8> {
        let mut stream = RlpStream::new_list(16);
        for i in 0..16u64 {
            if i as usize == MIX_HASH_INDEX {
                stream.append(&mix.as_bytes().to_vec());
            } else {
                stream.append(&(i * 1000));
            }
        }
        stream.out().to_vec()
    }

    #[test]
    fn test_verify_samples_folds_submitted_samples() {
        let ledger = stocked_ledger(small_config());
        for seed in 0..8u64 {
            let hash0 = keccak256(&seed.to_be_bytes());
            let sub = build_submission(&ledger, 0, miner(), 0, hash0, zero_decode_proof);
            let folded = ledger
                .verify_samples(
                    0,
                    hash0,
                    miner(),
                    &sub.encoded_samples,
                    &sub.masks,
                    &sub.inclusion_proofs,
                    &sub.decode_proofs,
                )
                .unwrap();
            let expected = sub
                .encoded_samples
                .iter()
                .fold(hash0, |h, s| get_next_hash0(h, *s));
            assert_eq!(folded, expected);
        }
    }

    #[test]
    fn test_every_shard_can_be_mined() {
        let mut config = small_config();
        config.prepaid_amount = U256::exp10(18);
        config.dcf_factor = Q128_ONE >> 1;
        let mut ledger = stocked_ledger(config);
        ledger.fund(&BlockContext::new(1, 0), U256::exp10(18));

        for shard in 0..ledger.shard_count() {
            let hash0 = H256::from_low_u64_be(0x54 + shard);
            let sub = build_submission(&ledger, shard, miner(), 1, hash0, zero_decode_proof);
            let outcome = ledger
                .mine_with_fixed_hash0(&BlockContext::new(2, 2), hash0, &sub)
                .unwrap();
            assert_eq!(outcome.shard_idx, shard);
            assert_eq!(ledger.shard_state(shard).unwrap().blocks_mined, 1);
        }

        // shard 0: prepaid 1e18 halved twice over two seconds
        assert_eq!(
            ledger.shard_state(0).unwrap().reward_pool,
            U256::exp10(18) / 4
        );
        assert!(ledger.balance_of(&miner()) >= U256::exp10(18) * 3 / 4);
    }

    #[test]
    fn test_copied_samples_fail_for_another_miner() {
        let mut ledger = stocked_ledger(small_config());
        let hash0 = H256::from_low_u64_be(7);
        let mut sub = build_submission(&ledger, 0, miner(), 0, hash0, zero_decode_proof);
        sub.miner = H160::from_low_u64_be(0xb0b);

        let result = ledger.mine_with_fixed_hash0(&BlockContext::new(2, 5), hash0, &sub);
        assert!(matches!(
            result,
            Err(StorageError::ProofVerification { index: 0, .. })
        ));
        assert_eq!(ledger.shard_state(0).unwrap().blocks_mined, 0);
        assert!(ledger.balance_of(&sub.miner).is_zero());
    }

    #[test]
    fn test_tampered_sample_aborts_whole_mine() {
        let mut ledger = stocked_ledger(small_config());
        let hash0 = H256::from_low_u64_be(9);
        let mut sub = build_submission(&ledger, 0, miner(), 0, hash0, zero_decode_proof);
        let last = sub.encoded_samples.len() - 1;
        sub.encoded_samples[last] = H256::repeat_byte(0xee);

        let events_before = ledger.events().len();
        let result = ledger.mine_with_fixed_hash0(&BlockContext::new(2, 5), hash0, &sub);
        assert!(matches!(
            result,
            Err(StorageError::ProofVerification { index, .. }) if index == last
        ));
        assert_eq!(ledger.events().len(), events_before);
    }

    #[test]
    fn test_remove_invalidates_stale_submission() {
        let mut ledger = stocked_ledger(small_config());
        // pick a seed whose first sample lands in kvIdx 0
        let hash0 = (0u64..)
            .map(H256::from_low_u64_be)
            .find(|h| ledger.get_sample_idx(0, *h).1 == 0)
            .unwrap();
        let sub = build_submission(&ledger, 0, miner(), 0, hash0, zero_decode_proof);

        // key(3) moves into kvIdx 0 and changes its content
        ledger
            .remove(&BlockContext::new(2, 3), client(), key(1))
            .unwrap();
        assert_eq!(ledger.get_kv_idx(client(), &key(3)), Some(0));
        assert!(ledger
            .mine_with_fixed_hash0(&BlockContext::new(3, 4), hash0, &sub)
            .is_err());

        let fresh = build_submission(&ledger, 0, miner(), 0, hash0, zero_decode_proof);
        ledger
            .mine_with_fixed_hash0(&BlockContext::new(3, 4), hash0, &fresh)
            .unwrap();
    }

    #[test]
    fn test_mine_from_block_randomness() {
        let mut config = small_config();
        config.prepaid_amount = U256::exp10(18);
        config.dcf_factor = Q128_ONE >> 1;
        config.treasury_share = 1000;
        config.treasury = H160::from_low_u64_be(0x7e);
        let mut ledger = stocked_ledger(config);

        let header = header_with_mix(H256::repeat_byte(0x42));
        let mut chain = RecentBlockHashes::new();
        chain.push(100, keccak256(&header));
        chain.push(101, H256::repeat_byte(1));

        let nonce = 3;
        let hash0 = get_init_hash0(H256::repeat_byte(0x42), miner(), nonce);
        let sub = build_submission(&ledger, 0, miner(), nonce, hash0, zero_decode_proof);

        // now = 30 in block 102: the mine is dated two blocks back, at t = 6
        let outcome = ledger
            .mine(&BlockContext::new(102, 30), &chain, 100, &header, &sub)
            .unwrap();
        assert_eq!(outcome.mine_time, 6);
        assert_eq!(outcome.init_hash0, hash0);

        // 1e18 * (1 - 2^-6) released, 10% of it to the treasury
        let released = U256::exp10(18) - U256::exp10(18) / 64;
        assert_eq!(outcome.treasury_fee + outcome.miner_reward, released);
        assert_eq!(outcome.treasury_fee, released / 10);
        assert_eq!(ledger.balance_of(&H160::from_low_u64_be(0x7e)), released / 10);

        // the same seed cannot be reused with a wrong header
        let other = header_with_mix(H256::repeat_byte(0x43));
        assert!(matches!(
            ledger.mine(&BlockContext::new(102, 30), &chain, 100, &other, &sub),
            Err(StorageError::RandomnessMismatch(_))
        ));
    }

    #[test]
    fn test_difficulty_rises_with_fast_mining() {
        let mut config = small_config();
        config.minimum_diff = U256::from(16u64);
        config.diff_adj_divisor = 8;
        let mut ledger = stocked_ledger(config);

        let mut mined = 0;
        let mut seed = 0u64;
        let mut last = U256::from(16u64);
        while mined < 3 {
            seed += 1;
            let hash0 = keccak256(&seed.to_be_bytes());
            let sub = build_submission(&ledger, 0, miner(), 0, hash0, zero_decode_proof);
            let ctx = BlockContext::new(10 + mined, 10 + mined);
            match ledger.mine_with_fixed_hash0(&ctx, hash0, &sub) {
                Ok(outcome) => {
                    assert!(outcome.difficulty > last);
                    last = outcome.difficulty;
                    mined += 1;
                }
                Err(StorageError::Difficulty { .. }) => continue,
                Err(other) => panic!("unexpected error {other}"),
            }
        }
        assert_eq!(ledger.shard_state(0).unwrap().difficulty, last);
    }
}
