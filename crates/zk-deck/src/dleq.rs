//! non-interactive proof of discrete logarithm equality
//!
//! proves knowledge of x such that gx = x*g and hx = x*h without revealing
//! which x. the challenge hashes both commitments and both public values;
//! the response t = r + c*x is carried as an unbounded integer. no reduction
//! mod n is performed on t: that is part of the wire contract, and
//! verification is unaffected because k*P only depends on k mod n.

use num_bigint::BigUint;
use rand::{CryptoRng, RngCore};

use crate::curve::{self, Point};
use crate::oracle::RomQuery;
use crate::{DeckError, Result};

/// proof scalars (r, t), both rendered in decimal on the wire
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DleqProof {
    pub r: BigUint,
    pub t: BigUint,
}

/// prove log_g(gx) = log_h(hx) with witness x
pub fn prove<R: RngCore + CryptoRng>(
    g: &Point,
    gx: &Point,
    h: &Point,
    hx: &Point,
    x: &BigUint,
    rng: &mut R,
) -> Result<DleqProof> {
    let r = curve::rand_scalar(rng);
    let rg = g.mul(&r);
    let rh = h.mul(&r);
    let c = challenge(&rg, &rh, gx, hx).ok_or(DeckError::IdentityPoint)?;
    let t = &r + c * x;
    Ok(DleqProof { r, t })
}

/// verify a proof against (g, gx, h, hx)
///
/// returns false on any mismatch, including a transcript that would need the
/// coordinates of the identity. never panics, never errors.
pub fn verify(g: &Point, gx: &Point, h: &Point, hx: &Point, proof: &DleqProof) -> bool {
    let rg = g.mul(&proof.r);
    let rh = h.mul(&proof.r);
    let c = match challenge(&rg, &rh, gx, hx) {
        Some(c) => c,
        None => return false,
    };
    g.mul(&proof.t) == rg + gx.mul(&c) && h.mul(&proof.t) == rh + hx.mul(&c)
}

/// c = H(Rg.x || Rg.y || Rh.x || Rh.y || gx.x || gx.y || hx.x || hx.y)
fn challenge(rg: &Point, rh: &Point, gx: &Point, hx: &Point) -> Option<BigUint> {
    let mut query = RomQuery::new();
    for point in [rg, rh, gx, hx] {
        query.feed_pair(&point.coords()?);
    }
    Some(query.challenge())
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::BigUint;
    use rand::rngs::OsRng;

    fn setup(rng: &mut OsRng) -> (Point, Point, Point, Point, BigUint) {
        let g = Point::generator().mul(&curve::rand_scalar(rng));
        let h = Point::generator().mul(&curve::rand_scalar(rng));
        let x = curve::rand_scalar(rng);
        (g.mul(&x), h.mul(&x), g, h, x)
    }

    #[test]
    fn test_roundtrip() {
        let mut rng = OsRng;
        let (gx, hx, g, h, x) = setup(&mut rng);
        let proof = prove(&g, &gx, &h, &hx, &x, &mut rng).unwrap();
        assert!(verify(&g, &gx, &h, &hx, &proof));
    }

    #[test]
    fn test_same_base_roundtrip() {
        // degenerate but valid: h = g
        let mut rng = OsRng;
        let g = Point::generator().mul(&curve::rand_scalar(&mut rng));
        let x = curve::rand_scalar(&mut rng);
        let gx = g.mul(&x);
        let proof = prove(&g, &gx, &g, &gx, &x, &mut rng).unwrap();
        assert!(verify(&g, &gx, &g, &gx, &proof));
    }

    #[test]
    fn test_tampered_response_rejected() {
        let mut rng = OsRng;
        let (gx, hx, g, h, x) = setup(&mut rng);
        let mut proof = prove(&g, &gx, &h, &hx, &x, &mut rng).unwrap();
        proof.t += 1u8;
        assert!(!verify(&g, &gx, &h, &hx, &proof));
    }

    #[test]
    fn test_tampered_nonce_rejected() {
        let mut rng = OsRng;
        let (gx, hx, g, h, x) = setup(&mut rng);
        let mut proof = prove(&g, &gx, &h, &hx, &x, &mut rng).unwrap();
        proof.r += 1u8;
        assert!(!verify(&g, &gx, &h, &hx, &proof));
    }

    #[test]
    fn test_swapped_points_rejected() {
        let mut rng = OsRng;
        let (gx, hx, g, h, x) = setup(&mut rng);
        let proof = prove(&g, &gx, &h, &hx, &x, &mut rng).unwrap();
        assert!(!verify(&h, &gx, &g, &hx, &proof));
        assert!(!verify(&g, &hx, &h, &gx, &proof));
    }

    #[test]
    fn test_wrong_witness_statement_rejected() {
        let mut rng = OsRng;
        let (gx, _hx, g, h, x) = setup(&mut rng);
        // hx computed under a different secret
        let y = curve::rand_scalar(&mut rng);
        let hy = h.mul(&y);
        let proof = prove(&g, &gx, &h, &hy, &x, &mut rng).unwrap();
        assert!(!verify(&g, &gx, &h, &hy, &proof));
    }

    #[test]
    fn test_identity_in_statement_rejected() {
        let mut rng = OsRng;
        let (gx, hx, g, h, x) = setup(&mut rng);
        let proof = prove(&g, &gx, &h, &hx, &x, &mut rng).unwrap();
        assert!(!verify(&g, &gx, &h, &Point::identity(), &proof));
    }
}
