//! Groth16 / BN254 decode-proof verification
//!
//! A miner discloses, per audited sample, a mask that must equal a
//! pseudorandom function of its encoding key and the sample index. The prover
//! toolchain is external; this module only checks the proofs it hands over.
//!
//! Proof points arrive in the EVM precompile layout: G1 as `[x, y]`, G2 as
//! `[[x.c1, x.c0], [y.c1, y.c0]]`. Anything that does not decode to a valid
//! curve point makes verification fail closed.

use ark_bn254::{Bn254, Fq, Fq2, Fr, G1Affine, G2Affine};
use ark_ff::{BigInt, PrimeField};
use ark_groth16::{Groth16, PreparedVerifyingKey, Proof, VerifyingKey};
use ark_serialize::CanonicalDeserialize;
use log::{debug, warn};
use primitive_types::U256;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::field::fr_from_u256;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Groth16Error {
    #[error("coordinate is not a canonical base-field element")]
    NonCanonicalCoordinate,
    #[error("point is not on the curve")]
    NotOnCurve,
    #[error("point is outside the prime-order subgroup")]
    WrongSubgroup,
    #[error("verifying key has {got} input bases, expected at least 1")]
    EmptyInputBases { got: usize },
    #[error("verifying key bytes are malformed: {0}")]
    MalformedKey(String),
}

/// Pluggable verifier for decode proofs.
pub trait ProofVerifier {
    /// `true` iff `proof` attests to `public_inputs`.
    fn verify(&self, proof: &DecodeProof, public_inputs: &[U256]) -> bool;
}

/// Groth16 proof in EVM word layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodeProof {
    pub a: [U256; 2],
    pub b: [[U256; 2]; 2],
    pub c: [U256; 2],
}

/// Verifying key in EVM word layout, as emitted by Solidity verifier
/// generators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvmVerifyingKey {
    pub alpha1: [U256; 2],
    pub beta2: [[U256; 2]; 2],
    pub gamma2: [[U256; 2]; 2],
    pub delta2: [[U256; 2]; 2],
    pub ic: Vec<[U256; 2]>,
}

fn fq(word: U256) -> Result<Fq, Groth16Error> {
    Fq::from_bigint(BigInt::new(word.0)).ok_or(Groth16Error::NonCanonicalCoordinate)
}

fn g1(point: &[U256; 2]) -> Result<G1Affine, Groth16Error> {
    if point[0].is_zero() && point[1].is_zero() {
        return Ok(G1Affine::identity());
    }
    let p = G1Affine::new_unchecked(fq(point[0])?, fq(point[1])?);
    if !p.is_on_curve() {
        return Err(Groth16Error::NotOnCurve);
    }
    if !p.is_in_correct_subgroup_assuming_on_curve() {
        return Err(Groth16Error::WrongSubgroup);
    }
    Ok(p)
}

fn g2(point: &[[U256; 2]; 2]) -> Result<G2Affine, Groth16Error> {
    if point.iter().flatten().all(|w| w.is_zero()) {
        return Ok(G2Affine::identity());
    }
    let x = Fq2::new(fq(point[0][1])?, fq(point[0][0])?);
    let y = Fq2::new(fq(point[1][1])?, fq(point[1][0])?);
    let p = G2Affine::new_unchecked(x, y);
    if !p.is_on_curve() {
        return Err(Groth16Error::NotOnCurve);
    }
    if !p.is_in_correct_subgroup_assuming_on_curve() {
        return Err(Groth16Error::WrongSubgroup);
    }
    Ok(p)
}

fn g1_words(p: &G1Affine) -> [U256; 2] {
    if p.infinity {
        return [U256::zero(); 2];
    }
    [U256(p.x.into_bigint().0), U256(p.y.into_bigint().0)]
}

fn g2_words(p: &G2Affine) -> [[U256; 2]; 2] {
    if p.infinity {
        return [[U256::zero(); 2]; 2];
    }
    [
        [U256(p.x.c1.into_bigint().0), U256(p.x.c0.into_bigint().0)],
        [U256(p.y.c1.into_bigint().0), U256(p.y.c0.into_bigint().0)],
    ]
}

impl DecodeProof {
    pub fn to_ark(&self) -> Result<Proof<Bn254>, Groth16Error> {
        Ok(Proof {
            a: g1(&self.a)?,
            b: g2(&self.b)?,
            c: g1(&self.c)?,
        })
    }

    pub fn from_ark(proof: &Proof<Bn254>) -> Self {
        Self {
            a: g1_words(&proof.a),
            b: g2_words(&proof.b),
            c: g1_words(&proof.c),
        }
    }
}

impl EvmVerifyingKey {
    pub fn to_ark(&self) -> Result<VerifyingKey<Bn254>, Groth16Error> {
        if self.ic.is_empty() {
            return Err(Groth16Error::EmptyInputBases { got: 0 });
        }
        Ok(VerifyingKey {
            alpha_g1: g1(&self.alpha1)?,
            beta_g2: g2(&self.beta2)?,
            gamma_g2: g2(&self.gamma2)?,
            delta_g2: g2(&self.delta2)?,
            gamma_abc_g1: self.ic.iter().map(g1).collect::<Result<Vec<_>, _>>()?,
        })
    }

    pub fn from_ark(vk: &VerifyingKey<Bn254>) -> Self {
        Self {
            alpha1: g1_words(&vk.alpha_g1),
            beta2: g2_words(&vk.beta_g2),
            gamma2: g2_words(&vk.gamma_g2),
            delta2: g2_words(&vk.delta_g2),
            ic: vk.gamma_abc_g1.iter().map(g1_words).collect(),
        }
    }
}

/// Groth16 verifier over BN254 with a prepared key.
pub struct Groth16Verifier {
    pvk: PreparedVerifyingKey<Bn254>,
    input_count: usize,
}

impl Groth16Verifier {
    pub fn new(vk: VerifyingKey<Bn254>) -> Result<Self, Groth16Error> {
        let input_count = vk
            .gamma_abc_g1
            .len()
            .checked_sub(1)
            .ok_or(Groth16Error::EmptyInputBases { got: 0 })?;
        Ok(Self {
            pvk: PreparedVerifyingKey::from(vk),
            input_count,
        })
    }

    pub fn from_evm_key(key: &EvmVerifyingKey) -> Result<Self, Groth16Error> {
        Self::new(key.to_ark()?)
    }

    /// Loads an arkworks compressed verifying key.
    pub fn from_compressed_key(bytes: &[u8]) -> Result<Self, Groth16Error> {
        let vk = VerifyingKey::<Bn254>::deserialize_compressed(bytes)
            .map_err(|e| Groth16Error::MalformedKey(e.to_string()))?;
        Self::new(vk)
    }

    pub fn input_count(&self) -> usize {
        self.input_count
    }
}

impl ProofVerifier for Groth16Verifier {
    fn verify(&self, proof: &DecodeProof, public_inputs: &[U256]) -> bool {
        if public_inputs.len() != self.input_count {
            warn!(
                "decode proof rejected: {} public inputs, key expects {}",
                public_inputs.len(),
                self.input_count
            );
            return false;
        }

        let inputs: Option<Vec<Fr>> = public_inputs.iter().map(|w| fr_from_u256(*w)).collect();
        let Some(inputs) = inputs else {
            debug!("decode proof rejected: public input outside the scalar field");
            return false;
        };

        let proof = match proof.to_ark() {
            Ok(proof) => proof,
            Err(err) => {
                debug!("decode proof rejected: {}", err);
                return false;
            }
        };

        Groth16::<Bn254>::verify_proof(&self.pvk, &proof, &inputs).unwrap_or(false)
    }
}
