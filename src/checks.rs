use subtle::ConstantTimeEq;

use crate::attributes::*;
use crate::error::*;

/// check_size returns Error::AttributeSizeInvalid if got is not equal to expected.
pub fn check_size(_at: AttrType, got: usize, expected: usize) -> Result<()> {
    if got == expected {
        Ok(())
    } else {
        Err(Error::AttributeSizeInvalid)
    }
}

/// check_overflow returns Error::AttributeSizeOverflow if got is bigger than max.
pub fn check_overflow(_at: AttrType, got: usize, max: usize) -> Result<()> {
    if got <= max {
        Ok(())
    } else {
        Err(Error::AttributeSizeOverflow)
    }
}

/// check_hmac compares two HMACs in constant time, returning Error::IntegrityMismatch
/// on mismatch.
pub fn check_hmac(got: &[u8], expected: &[u8]) -> Result<()> {
    if got.ct_eq(expected).into() {
        Ok(())
    } else {
        Err(Error::IntegrityMismatch)
    }
}

/// check_fingerprint compares a decoded FINGERPRINT value against the expected
/// CRC-32, returning Error::FingerprintMismatch on mismatch.
pub fn check_fingerprint(got: u32, expected: u32) -> Result<()> {
    if got == expected {
        Ok(())
    } else {
        Err(Error::FingerprintMismatch)
    }
}
