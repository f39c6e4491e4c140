/// BN254 scalar-field helpers used to build decode-proof public inputs.

use ark_bn254::Fr;
use ark_ff::{BigInt, BigInteger, Field, PrimeField};
use primitive_types::U256;

/// Generator used to derive the evaluation-domain root of unity.
pub const DOMAIN_GENERATOR: u64 = 5;

/// Default log2 of the evaluation-domain size (4096 field elements per value).
pub const DEFAULT_PRF_DOMAIN_BITS: u32 = 12;

/// Scalar field modulus as a 256-bit word
pub fn modulus() -> U256 {
    U256(Fr::MODULUS.0)
}

/// Converts a word into a field element, `None` if it is not canonical.
pub fn fr_from_u256(value: U256) -> Option<Fr> {
    Fr::from_bigint(BigInt::new(value.0))
}

pub fn fr_to_u256(value: Fr) -> U256 {
    U256(value.into_bigint().0)
}

/// `value mod p`
pub fn reduce(value: U256) -> Fr {
    let mut bytes = [0u8; 32];
    value.to_little_endian(&mut bytes);
    Fr::from_le_bytes_mod_order(&bytes)
}

/// `5^((p - 1) / 2^domain_bits)`
pub fn domain_root(domain_bits: u32) -> Fr {
    let mut exponent = Fr::MODULUS;
    exponent.sub_with_borrow(&BigInt::from(1u64));
    exponent.divn(domain_bits);
    Fr::from(DOMAIN_GENERATOR).pow(exponent)
}

/// Evaluation point of sample `index`: `ω^index`.
pub fn sample_point(index: u64, domain_bits: u32) -> Fr {
    domain_root(domain_bits).pow([index])
}
