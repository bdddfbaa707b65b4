use num_bigint::{BigUint, IntoBigUint, ModInverse};
use num_integer::Integer;
use num_traits::{One, Zero};
use rand::RngCore;
use zeroize::{Zeroize, Zeroizing};

use crate::asn1::DerWriter;
use crate::constants::{KEY_CHECK_PROBE, MAX_FACTOR_ATTEMPTS};
use crate::error::{Cal0Error, Cal0Result};

/**
    RSA public key as carried in the device SSL certificate.
*/
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RsaPublicKey {
    n: BigUint,
    e: BigUint,
}

impl RsaPublicKey {
    pub fn new(n: BigUint, e: BigUint) -> Self {
        Self { n, e }
    }

    /**
        Modulus.
    */
    pub fn n(&self) -> &BigUint {
        &self.n
    }

    /**
        Public exponent.
    */
    pub fn e(&self) -> &BigUint {
        &self.e
    }

    /**
        Modulus size in bits.
    */
    pub fn bits(&self) -> usize {
        self.n.bits()
    }
}

/**
    Complete two-prime RSA private key, ready for PKCS#1 encoding.

    Invariants: `n = p * q`, `p > q`, `dp = d mod (p-1)`, `dq = d mod (q-1)`,
    `qinv * q ≡ 1 (mod p)`. Secret components are wiped on drop.
*/
#[derive(Clone, PartialEq, Eq)]
pub struct RsaPrivateKeyMaterial {
    n: BigUint,
    e: BigUint,
    d: BigUint,
    p: BigUint,
    q: BigUint,
    dp: BigUint,
    dq: BigUint,
    qinv: BigUint,
}

impl RsaPrivateKeyMaterial {
    pub fn n(&self) -> &BigUint {
        &self.n
    }

    pub fn e(&self) -> &BigUint {
        &self.e
    }

    pub fn d(&self) -> &BigUint {
        &self.d
    }

    /**
        Larger prime factor.
    */
    pub fn p(&self) -> &BigUint {
        &self.p
    }

    /**
        Smaller prime factor.
    */
    pub fn q(&self) -> &BigUint {
        &self.q
    }

    /**
        D mod (P-1)
    */
    pub fn dp(&self) -> &BigUint {
        &self.dp
    }

    /**
        D mod (Q-1)
    */
    pub fn dq(&self) -> &BigUint {
        &self.dq
    }

    /**
        Q^-1 mod P
    */
    pub fn qinv(&self) -> &BigUint {
        &self.qinv
    }

    pub fn public_key(&self) -> RsaPublicKey {
        RsaPublicKey::new(self.n.clone(), self.e.clone())
    }

    /**
        Encode as a PKCS#1 `RSAPrivateKey` (RFC 8017, A.1.2), two-prime version 0:

          RSAPrivateKey ::= SEQUENCE {
              version           INTEGER,  -- 0
              modulus           INTEGER,  -- n
              publicExponent    INTEGER,  -- e
              privateExponent   INTEGER,  -- d
              prime1            INTEGER,  -- p
              prime2            INTEGER,  -- q
              exponent1         INTEGER,  -- d mod (p-1)
              exponent2         INTEGER,  -- d mod (q-1)
              coefficient       INTEGER   -- (inverse of q) mod p
          }
    */
    pub fn to_pkcs1_der(&self) -> Zeroizing<Vec<u8>> {
        let mut writer = DerWriter::new();
        writer
            .begin_sequence()
            .integer(&BigUint::zero())
            .integer(&self.n)
            .integer(&self.e)
            .integer(&self.d)
            .integer(&self.p)
            .integer(&self.q)
            .integer(&self.dp)
            .integer(&self.dq)
            .integer(&self.qinv)
            .end_sequence();
        Zeroizing::new(writer.finish())
    }
}

impl std::fmt::Debug for RsaPrivateKeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RsaPrivateKeyMaterial")
            .field("n", &self.n)
            .field("e", &self.e)
            .finish_non_exhaustive()
    }
}

impl Zeroize for RsaPrivateKeyMaterial {
    fn zeroize(&mut self) {
        self.d.zeroize();
        self.p.zeroize();
        self.q.zeroize();
        self.dp.zeroize();
        self.dq.zeroize();
        self.qinv.zeroize();
    }
}

impl Drop for RsaPrivateKeyMaterial {
    fn drop(&mut self) {
        self.zeroize();
    }
}

/**
    Rebuild the full private key from the public key and a raw big-endian
    private exponent, drawing randomness from the thread RNG.
*/
pub fn recover(public: &RsaPublicKey, d: &[u8]) -> Cal0Result<RsaPrivateKeyMaterial> {
    recover_with_rng(public, d, &mut rand::rng())
}

/**
    Rebuild the full private key from the public key and a raw big-endian
    private exponent.

    1. Check that `(probe^d)^e ≡ probe (mod n)`, otherwise the exponent
       (or the KEK that decrypted it) is wrong.
    2. Factor `n` from `(e, d)` with randomised square-root-of-unity search.
    3. Derive the CRT parameters.

    The recovered key does not depend on the RNG: the factor pair of `n` is
    unique and is always ordered `p > q`.
*/
pub fn recover_with_rng<R: RngCore + ?Sized>(
    public: &RsaPublicKey,
    d: &[u8],
    rng: &mut R,
) -> Cal0Result<RsaPrivateKeyMaterial> {
    let n = public.n();
    let e = public.e();
    let d = Zeroizing::new(BigUint::from_bytes_be(d));

    if n <= &BigUint::one() || e.is_zero() {
        return Err(Cal0Error::KeyMismatch);
    }

    let probe = BigUint::from(KEY_CHECK_PROBE) % n;
    if probe.modpow(&d, n).modpow(e, n) != probe {
        return Err(Cal0Error::KeyMismatch);
    }

    let (p, q) = factor_modulus(n, e, &d, rng)?;

    let one = BigUint::one();
    let dp = &*d % (&p - &one);
    let dq = &*d % (&q - &one);
    let qinv = q
        .clone()
        .mod_inverse(&p)
        .and_then(|v| v.into_biguint())
        .ok_or_else(|| factor_err("prime factors are not coprime"))?;

    Ok(RsaPrivateKeyMaterial {
        n: n.clone(),
        e: e.clone(),
        d: (*d).clone(),
        p,
        q,
        dp,
        dq,
        qinv,
    })
}

/**
    Split `n` into `(p, q)` with `p > q` given a matching exponent pair.

    With `e*d - 1 = r * 2^t` (r odd), every unit g satisfies g^(r*2^t) ≡ 1.
    Walking y = g^r, y^2, y^4, ... the first value to square to 1 is a square
    root of unity; if it is neither 1 nor n-1 then gcd(y - 1, n) is a proper
    factor. At least half of all g give such a root, so each draw either
    succeeds or is retried until the attempt cap.
*/
fn factor_modulus<R: RngCore + ?Sized>(
    n: &BigUint,
    e: &BigUint,
    d: &BigUint,
    rng: &mut R,
) -> Cal0Result<(BigUint, BigUint)> {
    let one = BigUint::one();
    let n_minus_one = n - &one;

    let k = e * d;
    if k.is_zero() {
        return Err(factor_err("e*d - 1 is negative"));
    }
    let mut r = k - &one;
    if r.is_zero() || r.is_odd() {
        return Err(factor_err("e*d - 1 is not even"));
    }
    let mut t = 0usize;
    while r.is_even() {
        r = r >> 1usize;
        t += 1;
    }

    for attempt in 1..=MAX_FACTOR_ATTEMPTS {
        let g = random_below(n, rng);
        let Some(root) = nontrivial_sqrt_of_unity(&g, &r, t, n, &n_minus_one) else {
            log::trace!("factor attempt {attempt} inconclusive");
            continue;
        };

        let p = (&root - &one).gcd(n);
        if p <= one || &p >= n || !(n % &p).is_zero() {
            return Err(factor_err("square root of unity did not split the modulus"));
        }
        let q = n / &p;

        log::debug!("factored {}-bit modulus after {attempt} attempt(s)", n.bits());
        return Ok(if p > q { (p, q) } else { (q, p) });
    }

    Err(factor_err(&format!(
        "no factor found after {MAX_FACTOR_ATTEMPTS} attempts"
    )))
}

/**
    One trial of the search: returns x with x^2 ≡ 1 (mod n) and x ∉ {1, n-1},
    or `None` when this base is inconclusive.
*/
fn nontrivial_sqrt_of_unity(
    g: &BigUint,
    r: &BigUint,
    t: usize,
    n: &BigUint,
    n_minus_one: &BigUint,
) -> Option<BigUint> {
    let mut y = g.modpow(r, n);
    if y.is_one() || &y == n_minus_one {
        return None;
    }

    // y is now neither 1 nor n-1; square at most t times looking for 1
    for _ in 0..t {
        let x = (&y * &y) % n;
        if x.is_one() {
            return Some(y);
        }
        if &x == n_minus_one {
            return None;
        }
        y = x;
    }

    // g^(e*d-1) != 1, so g shares a factor with n or the exponents are bogus
    None
}

/**
    Uniform draw from `[0, n)` by rejection sampling on `n.bits()` random bits.
*/
fn random_below<R: RngCore + ?Sized>(n: &BigUint, rng: &mut R) -> BigUint {
    let bits = n.bits();
    let mut buf = Zeroizing::new(vec![0u8; bits.div_ceil(8)]);
    let excess = buf.len() * 8 - bits;
    loop {
        rng.fill_bytes(&mut buf);
        buf[0] &= 0xFF >> excess;
        let candidate = BigUint::from_bytes_be(&buf);
        if &candidate < n {
            return candidate;
        }
    }
}

fn factor_err(msg: &str) -> Cal0Error {
    Cal0Error::FactorizationError(msg.into())
}
