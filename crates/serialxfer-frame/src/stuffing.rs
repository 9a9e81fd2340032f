//! Reversible escaping of the start marker inside a frame body.
//!
//! The body is `[packet_id][length][payload..]`. Every byte equal to the
//! start marker is replaced with a placeholder and its offset (relative to
//! `packet_id`) is recorded in the overhead field:
//!
//! ```text
//! ┌────────────┬────────────┬─────┬──────────────────┐
//! │ Count (1B) │ Offset 0   │ ... │ Offset Count-1   │
//! └────────────┴────────────┴─────┴──────────────────┘
//! ```
//!
//! Offsets are strictly increasing, so a body can hold at most
//! [`MAX_STUFFED_LEN`] bytes.

use bytes::BufMut;

/// Longest body whose offsets fit in one byte each.
pub const MAX_STUFFED_LEN: usize = 255;

/// Structural problems found while stuffing or unstuffing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StuffError {
    /// The body is too long for one-byte offsets.
    #[error("body too long to stuff ({len} bytes, max {max})")]
    TooLong { len: usize, max: usize },

    /// The overhead field is shorter than its count byte claims.
    #[error("overhead field truncated (count {count}, {present} offsets present)")]
    Truncated { count: usize, present: usize },

    /// An offset points past the end of the body.
    #[error("escape offset {offset} outside body of {len} bytes")]
    OffsetOutOfRange { offset: u8, len: usize },

    /// Offsets are not strictly increasing.
    #[error("escape offsets not strictly increasing at {offset}")]
    Unordered { offset: u8 },

    /// An escaped position does not hold the placeholder byte.
    #[error("escaped position {offset} does not hold the placeholder")]
    NotPlaceholder { offset: u8 },

    /// An unescaped start marker was found inside the body.
    #[error("unescaped start marker at {offset}")]
    StrayMarker { offset: usize },
}

/// Escape metadata carried on the wire ahead of the frame body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overhead {
    offsets: Vec<u8>,
}

impl Overhead {
    /// Offsets of escaped bytes, in increasing order.
    pub fn offsets(&self) -> &[u8] {
        &self.offsets
    }

    /// Number of escaped bytes.
    pub fn count(&self) -> usize {
        self.offsets.len()
    }

    /// Size of the encoded field: the count byte plus one byte per offset.
    pub fn encoded_len(&self) -> usize {
        1 + self.offsets.len()
    }

    /// Append the wire encoding to `dst`.
    pub fn encode(&self, dst: &mut impl BufMut) {
        // Stuffing caps the body at MAX_STUFFED_LEN, so the count fits.
        dst.put_u8(self.offsets.len() as u8);
        dst.put_slice(&self.offsets);
    }

    /// Parse a complete encoded field.
    pub fn decode(field: &[u8]) -> Result<Self, StuffError> {
        let (&count, offsets) = field.split_first().ok_or(StuffError::Truncated {
            count: 1,
            present: 0,
        })?;
        let count = usize::from(count);
        if offsets.len() < count {
            return Err(StuffError::Truncated {
                count,
                present: offsets.len(),
            });
        }
        let offsets = offsets[..count].to_vec();
        check_order(&offsets)?;
        Ok(Self { offsets })
    }
}

/// Stuffing parameters: the reserved marker and its stand-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stuffer {
    marker: u8,
    placeholder: u8,
}

impl Stuffer {
    /// `placeholder` must differ from `marker`; `LinkConfig` enforces this.
    pub const fn new(marker: u8, placeholder: u8) -> Self {
        Self {
            marker,
            placeholder,
        }
    }

    pub fn marker(&self) -> u8 {
        self.marker
    }

    pub fn placeholder(&self) -> u8 {
        self.placeholder
    }

    /// Escape every marker in `body`, returning where they were.
    pub fn stuff_in_place(&self, body: &mut [u8]) -> Result<Overhead, StuffError> {
        if body.len() > MAX_STUFFED_LEN {
            return Err(StuffError::TooLong {
                len: body.len(),
                max: MAX_STUFFED_LEN,
            });
        }
        let mut offsets = Vec::new();
        for (offset, byte) in body.iter_mut().enumerate() {
            if *byte == self.marker {
                *byte = self.placeholder;
                offsets.push(offset as u8);
            }
        }
        Ok(Overhead { offsets })
    }

    /// Restore the marker at every offset, validating the escape layout.
    ///
    /// On error `body` may be partially restored; callers discard it.
    pub fn unstuff_in_place(&self, body: &mut [u8], offsets: &[u8]) -> Result<(), StuffError> {
        check_order(offsets)?;

        if let Some(offset) = body.iter().position(|&byte| byte == self.marker) {
            return Err(StuffError::StrayMarker { offset });
        }

        let len = body.len();
        for &offset in offsets {
            let slot = body
                .get_mut(usize::from(offset))
                .ok_or(StuffError::OffsetOutOfRange { offset, len })?;
            if *slot != self.placeholder {
                return Err(StuffError::NotPlaceholder { offset });
            }
            *slot = self.marker;
        }
        Ok(())
    }

    /// Copying form of [`stuff_in_place`](Self::stuff_in_place).
    pub fn stuff(&self, body: &[u8]) -> Result<(Overhead, Vec<u8>), StuffError> {
        let mut stuffed = body.to_vec();
        let overhead = self.stuff_in_place(&mut stuffed)?;
        Ok((overhead, stuffed))
    }

    /// Copying form of [`unstuff_in_place`](Self::unstuff_in_place).
    pub fn unstuff(&self, overhead: &Overhead, stuffed: &[u8]) -> Result<Vec<u8>, StuffError> {
        let mut body = stuffed.to_vec();
        self.unstuff_in_place(&mut body, overhead.offsets())?;
        Ok(body)
    }
}

fn check_order(offsets: &[u8]) -> Result<(), StuffError> {
    match offsets.windows(2).find(|pair| pair[1] <= pair[0]) {
        Some(pair) => Err(StuffError::Unordered { offset: pair[1] }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use bytes::BytesMut;
    use proptest::prelude::*;

    use super::*;

    const MARKER: u8 = 0x7E;
    const STUFFER: Stuffer = Stuffer::new(MARKER, 0x00);

    #[test]
    fn no_markers_leaves_body_untouched() {
        let (overhead, stuffed) = STUFFER.stuff(&[0x05, 0x03, 0x01, 0x02, 0x03]).unwrap();
        assert_eq!(overhead.count(), 0);
        assert_eq!(stuffed, [0x05, 0x03, 0x01, 0x02, 0x03]);
    }

    #[test]
    fn single_marker_recorded() {
        let body = [0x05, 0x04, 0x01, 0x02, MARKER, 0x03];
        let (overhead, stuffed) = STUFFER.stuff(&body).unwrap();

        assert_eq!(overhead.offsets(), &[4]);
        assert_eq!(stuffed, [0x05, 0x04, 0x01, 0x02, 0x00, 0x03]);
        assert_eq!(STUFFER.unstuff(&overhead, &stuffed).unwrap(), body);
    }

    #[test]
    fn markers_in_header_are_escaped() {
        let body = [MARKER, MARKER, 0x11];
        let (overhead, stuffed) = STUFFER.stuff(&body).unwrap();

        assert_eq!(overhead.offsets(), &[0, 1]);
        assert!(!stuffed.contains(&MARKER));
        assert_eq!(STUFFER.unstuff(&overhead, &stuffed).unwrap(), body);
    }

    #[test]
    fn all_marker_body_roundtrips() {
        let body = vec![MARKER; MAX_STUFFED_LEN];
        let (overhead, stuffed) = STUFFER.stuff(&body).unwrap();

        assert_eq!(overhead.count(), MAX_STUFFED_LEN);
        assert!(stuffed.iter().all(|&b| b == 0x00));
        assert_eq!(STUFFER.unstuff(&overhead, &stuffed).unwrap(), body);
    }

    #[test]
    fn literal_placeholder_survives() {
        let body = [0x00, MARKER, 0x00];
        let (overhead, stuffed) = STUFFER.stuff(&body).unwrap();
        assert_eq!(STUFFER.unstuff(&overhead, &stuffed).unwrap(), body);
    }

    #[test]
    fn too_long_body_rejected() {
        let err = STUFFER.stuff(&[0u8; MAX_STUFFED_LEN + 1]).unwrap_err();
        assert!(matches!(err, StuffError::TooLong { .. }));
    }

    #[test]
    fn overhead_encode_decode() {
        let (overhead, _) = STUFFER.stuff(&[MARKER, 1, MARKER]).unwrap();
        let mut wire = BytesMut::new();
        overhead.encode(&mut wire);

        assert_eq!(wire.as_ref(), &[2, 0, 2]);
        assert_eq!(overhead.encoded_len(), 3);
        assert_eq!(Overhead::decode(&wire).unwrap(), overhead);
    }

    #[test]
    fn truncated_overhead_rejected() {
        let err = Overhead::decode(&[3, 0, 1]).unwrap_err();
        assert_eq!(err, StuffError::Truncated { count: 3, present: 2 });
        assert!(Overhead::decode(&[]).is_err());
    }

    #[test]
    fn offset_past_body_rejected() {
        let mut body = [0x00, 0x01];
        let err = STUFFER.unstuff_in_place(&mut body, &[5]).unwrap_err();
        assert!(matches!(err, StuffError::OffsetOutOfRange { offset: 5, .. }));
    }

    #[test]
    fn unordered_offsets_rejected() {
        let mut body = [0x00, 0x00, 0x00];
        let err = STUFFER.unstuff_in_place(&mut body, &[2, 1]).unwrap_err();
        assert_eq!(err, StuffError::Unordered { offset: 1 });
    }

    #[test]
    fn offset_without_placeholder_rejected() {
        let mut body = [0x00, 0x42];
        let err = STUFFER.unstuff_in_place(&mut body, &[1]).unwrap_err();
        assert_eq!(err, StuffError::NotPlaceholder { offset: 1 });
    }

    #[test]
    fn stray_marker_rejected() {
        let mut body = [0x01, MARKER];
        let err = STUFFER.unstuff_in_place(&mut body, &[]).unwrap_err();
        assert_eq!(err, StuffError::StrayMarker { offset: 1 });
    }

    proptest! {
        #[test]
        fn stuff_unstuff_roundtrip(body in proptest::collection::vec(any::<u8>(), 0..=MAX_STUFFED_LEN)) {
            let (overhead, stuffed) = STUFFER.stuff(&body).unwrap();
            prop_assert!(!stuffed.contains(&MARKER));
            prop_assert_eq!(STUFFER.unstuff(&overhead, &stuffed).unwrap(), body);
        }

        #[test]
        fn marker_heavy_roundtrip(body in proptest::collection::vec(prop_oneof![Just(MARKER), Just(0x00), any::<u8>()], 0..64)) {
            let (overhead, stuffed) = STUFFER.stuff(&body).unwrap();
            prop_assert_eq!(STUFFER.unstuff(&overhead, &stuffed).unwrap(), body);
        }
    }
}
