//! secp256r1 arithmetic adapter
//!
//! wraps the p256 group behind one concrete point type so the rest of the
//! crate never touches library internals and the curve could be swapped
//! later. coordinates surface as big integers because the wire contract
//! renders everything in decimal.

use core::ops::Add;

use num_bigint::BigUint;
use num_traits::Zero;
use p256::elliptic_curve::sec1::{FromEncodedPoint, ToEncodedPoint};
use p256::elliptic_curve::{Field, PrimeField};
use p256::{AffinePoint, EncodedPoint, FieldBytes, ProjectivePoint, Scalar};
use rand::{CryptoRng, RngCore};

use crate::{DeckError, Result};

/// order of the secp256r1 subgroup, big-endian hex
const ORDER_HEX: &[u8] = b"ffffffff00000000ffffffffffffffffbce6faada7179e84f3b9cac2fc632551";

/// subgroup order n
pub fn order() -> BigUint {
    BigUint::parse_bytes(ORDER_HEX, 16).expect("order constant parses")
}

/// a point on secp256r1
///
/// the identity only appears transiently inside additions; it is never
/// serialized and has no affine coordinates
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point(ProjectivePoint);

impl Point {
    /// the standard base point G
    pub fn generator() -> Self {
        Self(ProjectivePoint::GENERATOR)
    }

    /// the point at infinity
    pub fn identity() -> Self {
        Self(ProjectivePoint::IDENTITY)
    }

    /// scalar multiplication by an unbounded non-negative integer
    ///
    /// the scalar is reduced mod n internally, which is exact on a
    /// prime-order group: (k mod n)*P = k*P
    pub fn mul(&self, k: &BigUint) -> Self {
        Self(self.0 * scalar_from_biguint(k))
    }

    /// affine coordinates, None iff this is the identity
    pub fn coords(&self) -> Option<(BigUint, BigUint)> {
        let encoded = self.0.to_affine().to_encoded_point(false);
        match (encoded.x(), encoded.y()) {
            (Some(x), Some(y)) => Some((BigUint::from_bytes_be(x), BigUint::from_bytes_be(y))),
            _ => None,
        }
    }

    /// build a point from affine coordinates, validating it lies on the curve
    ///
    /// the identity has no affine encoding, so this can never produce it
    pub fn from_coords(x: &BigUint, y: &BigUint) -> Result<Self> {
        let (x, y) = match (field_bytes(x), field_bytes(y)) {
            (Some(x), Some(y)) => (x, y),
            _ => return Err(DeckError::NotOnCurve),
        };
        let encoded = EncodedPoint::from_affine_coordinates(&x, &y, false);
        let affine: Option<AffinePoint> = AffinePoint::from_encoded_point(&encoded).into();
        match affine {
            Some(p) => Ok(Self(ProjectivePoint::from(p))),
            None => Err(DeckError::NotOnCurve),
        }
    }

    pub fn is_identity(&self) -> bool {
        self.0 == ProjectivePoint::IDENTITY
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point(self.0 + rhs.0)
    }
}

/// uniform scalar in [0, n) from a CSPRNG
pub fn rand_scalar<R: RngCore + CryptoRng>(rng: &mut R) -> BigUint {
    let s = Scalar::random(&mut *rng);
    BigUint::from_bytes_be(&s.to_repr())
}

/// multiplicative inverse mod n, None iff k = 0 mod n
pub fn scalar_inverse(k: &BigUint) -> Option<BigUint> {
    let s = scalar_from_biguint(k);
    let inv: Option<Scalar> = s.invert().into();
    inv.map(|s| BigUint::from_bytes_be(&s.to_repr()))
}

/// true iff k = 0 mod n
pub fn scalar_is_zero(k: &BigUint) -> bool {
    (k % order()).is_zero()
}

fn scalar_from_biguint(k: &BigUint) -> Scalar {
    let reduced = k % order();
    let bytes = reduced.to_bytes_be();
    let mut buf = [0u8; 32];
    buf[32 - bytes.len()..].copy_from_slice(&bytes);
    let repr = FieldBytes::clone_from_slice(&buf);
    Option::<Scalar>::from(Scalar::from_repr(repr)).expect("reduced below the group order")
}

/// left-pad a big integer to 32 bytes, None if it does not fit
fn field_bytes(v: &BigUint) -> Option<FieldBytes> {
    let bytes = v.to_bytes_be();
    if bytes.len() > 32 {
        return None;
    }
    let mut buf = [0u8; 32];
    buf[32 - bytes.len()..].copy_from_slice(&bytes);
    Some(FieldBytes::clone_from_slice(&buf))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::OsRng;

    #[test]
    fn test_coords_roundtrip() {
        let mut rng = OsRng;
        let p = Point::generator().mul(&rand_scalar(&mut rng));
        let (x, y) = p.coords().unwrap();
        let q = Point::from_coords(&x, &y).unwrap();
        assert_eq!(p, q);
    }

    #[test]
    fn test_identity_has_no_coords() {
        assert!(Point::identity().coords().is_none());
        assert!(Point::identity().is_identity());
    }

    #[test]
    fn test_identity_absorbs_addition() {
        let p = Point::generator();
        assert_eq!(p + Point::identity(), p);
        assert_eq!(Point::identity() + p, p);
    }

    #[test]
    fn test_off_curve_rejected() {
        let err = Point::from_coords(&BigUint::from(1u8), &BigUint::from(1u8));
        assert!(matches!(err, Err(DeckError::NotOnCurve)));
    }

    #[test]
    fn test_mul_reduces_mod_order() {
        // (n + 2)*G = 2*G on a prime-order group
        let two = BigUint::from(2u8);
        let big = order() + &two;
        assert_eq!(Point::generator().mul(&big), Point::generator().mul(&two));
    }

    #[test]
    fn test_mul_distributes_over_sum() {
        let mut rng = OsRng;
        let a = rand_scalar(&mut rng);
        let b = rand_scalar(&mut rng);
        let g = Point::generator();
        assert_eq!(g.mul(&(&a + &b)), g.mul(&a) + g.mul(&b));
    }

    #[test]
    fn test_scalar_inverse() {
        let mut rng = OsRng;
        let k = rand_scalar(&mut rng);
        let inv = scalar_inverse(&k).unwrap();
        let g = Point::generator();
        assert_eq!(g.mul(&k).mul(&inv), g);
        assert!(scalar_inverse(&BigUint::zero()).is_none());
        assert!(scalar_inverse(&order()).is_none());
    }

    #[test]
    fn test_rand_scalar_below_order() {
        let mut rng = OsRng;
        for _ in 0..16 {
            assert!(rand_scalar(&mut rng) < order());
        }
    }
}
