//! Table-driven CRC-8 checksum engine.
//!
//! MSB-first, initial value 0, no reflection and no final xor. With the
//! default polynomial `0x9B` this is the CRC-8/LTE variant.

/// Default generator polynomial.
pub const DEFAULT_POLYNOMIAL: u8 = 0x9B;

/// Shared engine for [`DEFAULT_POLYNOMIAL`]; the table is built at compile time.
pub static CRC8: Crc8 = Crc8::new(DEFAULT_POLYNOMIAL);

/// CRC-8 engine holding a precomputed 256-entry lookup table.
#[derive(Clone)]
pub struct Crc8 {
    polynomial: u8,
    table: [u8; 256],
}

impl Default for Crc8 {
    fn default() -> Self {
        CRC8.clone()
    }
}

impl Crc8 {
    /// Build the lookup table for `polynomial`.
    pub const fn new(polynomial: u8) -> Self {
        let mut table = [0u8; 256];
        let mut i = 0;
        while i < 256 {
            let mut crc = i as u8;
            let mut bit = 0;
            while bit < 8 {
                crc = if crc & 0x80 != 0 {
                    (crc << 1) ^ polynomial
                } else {
                    crc << 1
                };
                bit += 1;
            }
            table[i] = crc;
            i += 1;
        }
        Self { polynomial, table }
    }

    /// Engine for `polynomial`, sharing [`CRC8`] when it is the default.
    pub fn for_polynomial(polynomial: u8) -> Self {
        if polynomial == DEFAULT_POLYNOMIAL {
            CRC8.clone()
        } else {
            Self::new(polynomial)
        }
    }

    pub fn polynomial(&self) -> u8 {
        self.polynomial
    }

    pub fn table(&self) -> &[u8; 256] {
        &self.table
    }

    /// Checksum of `bytes`.
    pub fn compute(&self, bytes: &[u8]) -> u8 {
        self.update(0, bytes)
    }

    /// Continue a running checksum over more bytes.
    pub fn update(&self, crc: u8, bytes: &[u8]) -> u8 {
        bytes
            .iter()
            .fold(crc, |crc, &byte| self.table[usize::from(crc ^ byte)])
    }
}

impl std::fmt::Debug for Crc8 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Crc8")
            .field("polynomial", &format_args!("{:#04x}", self.polynomial))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_value_matches_crc8_lte() {
        assert_eq!(CRC8.compute(b"123456789"), 0xEA);
    }

    #[test]
    fn table_edges() {
        assert_eq!(CRC8.table()[0], 0x00);
        assert_eq!(CRC8.table()[1], DEFAULT_POLYNOMIAL);
    }

    #[test]
    fn empty_input_is_zero() {
        assert_eq!(CRC8.compute(&[]), 0);
    }

    #[test]
    fn incremental_update_matches_one_shot() {
        let data = [0x05, 0x04, 0x01, 0x02, 0x7E, 0x03];
        let split = CRC8.update(CRC8.compute(&data[..2]), &data[2..]);
        assert_eq!(split, CRC8.compute(&data));
    }

    #[test]
    fn custom_polynomial_differs() {
        let crc = Crc8::for_polynomial(0x07);
        assert_eq!(crc.polynomial(), 0x07);
        // CRC-8/SMBUS check value.
        assert_eq!(crc.compute(b"123456789"), 0xF4);
        assert_ne!(crc.compute(b"abc"), CRC8.compute(b"abc"));
    }

    #[test]
    fn default_polynomial_shares_static_table() {
        let crc = Crc8::for_polynomial(DEFAULT_POLYNOMIAL);
        assert_eq!(crc.table(), CRC8.table());
    }
}
