use crate::{buffer::WriteBuffer, hash::HashScalar, util::Nonce, Error};

impl_scalar_type!(ProofChallenge, "A Fiat-Shamir challenge shared by one or more proofs");

/// Hash the challenge inputs of each proof in order, followed by the nonce
fn hash_challenge<'p>(
    proofs: impl IntoIterator<Item = &'p (dyn CreateChallenge + 'p)>,
    nonce: Nonce,
    dst: Option<&[u8]>,
) -> Result<ProofChallenge, Error> {
    let mut hasher = HashScalar::new(dst);
    for proof in proofs {
        proof.write_challenge_bytes(&mut hasher)?;
    }
    hasher.update(nonce.0.to_bytes());
    Ok(ProofChallenge(hasher.finalize().next()))
}

impl ProofChallenge {
    /// Derive a single challenge binding several proofs together
    pub fn create(
        proofs: &[&dyn CreateChallenge],
        nonce: Nonce,
        dst: Option<&[u8]>,
    ) -> Result<Self, Error> {
        hash_challenge(proofs.iter().copied(), nonce, dst)
    }
}

/// A proof, or proof verifier, contributing commitments to a challenge
pub trait CreateChallenge {
    /// Derive a challenge for this proof alone
    fn create_challenge(&self, nonce: Nonce, dst: Option<&[u8]>) -> Result<ProofChallenge, Error>
    where
        Self: Sized,
    {
        hash_challenge([self as &dyn CreateChallenge], nonce, dst)
    }

    fn write_challenge_bytes(&self, writer: &mut dyn WriteBuffer) -> Result<(), Error>;
}
