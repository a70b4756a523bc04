/// Largest prime smaller than 65536, per RFC 1950.
const ADLER_MOD: u32 = 65521;

/// Compute the Adler-32 checksum of a byte slice (RFC 1950).
///
/// `s1` starts at 1, `s2` at 0; both are reduced modulo 65521 after
/// every byte. The result packs `s2` into the high 16 bits and `s1`
/// into the low 16 bits.
pub fn adler32(data: &[u8]) -> u32 {
    let mut s1: u32 = 1;
    let mut s2: u32 = 0;
    for &byte in data {
        s1 = (s1 + u32::from(byte)) % ADLER_MOD;
        s2 = (s2 + s1) % ADLER_MOD;
    }
    (s2 << 16) | s1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input() {
        assert_eq!(adler32(b""), 0x0000_0001);
    }

    #[test]
    fn single_byte() {
        assert_eq!(adler32(b"a"), 0x0062_0062);
    }

    #[test]
    fn known_vector_wikipedia() {
        assert_eq!(adler32(b"Wikipedia"), 0x11E6_0398);
    }

    #[test]
    fn modulus_wraps() {
        // 5553 bytes of 0xFF force both sums past the modulus.
        let data = vec![0xFFu8; 5553];
        let checksum = adler32(&data);
        let s1 = checksum & 0xFFFF;
        let s2 = checksum >> 16;
        assert!(s1 < 65521);
        assert!(s2 < 65521);
    }
}
