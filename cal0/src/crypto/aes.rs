use aes::Aes128;
use ctr::cipher::{KeyIvInit, StreamCipher};
use zeroize::Zeroizing;

use crate::error::{Cal0Error, Cal0Result};

type Aes128Ctr = ctr::Ctr128BE<Aes128>;

/**
    AES-128-CTR decryption of the stored SSL key block.

    Key: the 16-byte `ssl_rsa_kek`.
    Counter: the 16-byte seed from the blob, read as one big-endian 128-bit
    integer and incremented once per block (carries run across all 128 bits).
    Output: plaintext of the same length as the ciphertext.
*/
pub fn aes_ctr_decrypt(
    kek: &[u8],
    counter: &[u8; 16],
    ciphertext: &[u8],
) -> Cal0Result<Zeroizing<Vec<u8>>> {
    let kek: &[u8; 16] = kek
        .try_into()
        .map_err(|_| Cal0Error::InvalidKey(kek.len()))?;

    let mut cipher = Aes128Ctr::new(kek.into(), counter.into());
    let mut plaintext = Zeroizing::new(ciphertext.to_vec());
    cipher.apply_keystream(&mut plaintext);
    Ok(plaintext)
}

#[cfg(test)]
mod tests {
    use super::*;
    use aes::cipher::{BlockEncrypt, KeyInit, generic_array::GenericArray};
    use hex_literal::hex;

    // NIST SP 800-38A, F.5.1 CTR-AES128
    const NIST_KEY: [u8; 16] = hex!("2b7e151628aed2a6abf7158809cf4f3c");
    const NIST_COUNTER: [u8; 16] = hex!("f0f1f2f3f4f5f6f7f8f9fafbfcfdfeff");
    const NIST_PLAINTEXT: [u8; 64] = hex!(
        "6bc1bee22e409f96e93d7e117393172a"
        "ae2d8a571e03ac9c9eb76fac45af8e51"
        "30c81c46a35ce411e5fbc1191a0a52ef"
        "f69f2445df4f9b17ad2b417be66c3710"
    );
    const NIST_CIPHERTEXT: [u8; 64] = hex!(
        "874d6191b620e3261bef6864990db6ce"
        "9806f66b7970fdff8617187bb9fffdff"
        "5ae4df3edbd5d35e5b4f09020db03eab"
        "1e031dda2fbe03d1792170a0f3009cee"
    );

    #[test]
    fn nist_known_answer() {
        let plaintext = aes_ctr_decrypt(&NIST_KEY, &NIST_COUNTER, &NIST_CIPHERTEXT).unwrap();
        assert_eq!(plaintext.as_slice(), NIST_PLAINTEXT);
    }

    #[test]
    fn counter_carries_across_all_128_bits() {
        let key = [0x42u8; 16];
        let counter = hex!("00000000000000ffffffffffffffffff");
        let next = hex!("00000000000001000000000000000000");

        let ciphertext = [0u8; 32];
        let keystream = aes_ctr_decrypt(&key, &counter, &ciphertext).unwrap();

        let cipher = Aes128::new(&key.into());
        let mut first = GenericArray::from(counter);
        let mut second = GenericArray::from(next);
        cipher.encrypt_block(&mut first);
        cipher.encrypt_block(&mut second);

        assert_eq!(&keystream[..16], first.as_slice());
        assert_eq!(&keystream[16..], second.as_slice());
    }

    #[test]
    fn partial_trailing_block() {
        let plaintext = aes_ctr_decrypt(&NIST_KEY, &NIST_COUNTER, &NIST_CIPHERTEXT[..20]).unwrap();
        assert_eq!(plaintext.as_slice(), &NIST_PLAINTEXT[..20]);
    }

    #[test]
    fn key_block_length_preserved() {
        let plaintext = aes_ctr_decrypt(&NIST_KEY, &NIST_COUNTER, &[0u8; 0x120]).unwrap();
        assert_eq!(plaintext.len(), 0x120);
    }

    #[test]
    fn wrong_key_length() {
        let err = aes_ctr_decrypt(&[0u8; 15], &NIST_COUNTER, &[0u8; 16]).unwrap_err();
        assert_eq!(err, Cal0Error::InvalidKey(15));

        let err = aes_ctr_decrypt(&[0u8; 32], &NIST_COUNTER, &[0u8; 16]).unwrap_err();
        assert_eq!(err, Cal0Error::InvalidKey(32));
    }
}
