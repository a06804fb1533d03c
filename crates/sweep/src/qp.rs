use std::fmt;
use serde::{Deserialize, Serialize};
use crate::error::SweepError;

/// QP values swept when nothing else is configured, in run order
pub const DEFAULT_QP_VALUES: [u8; 3] = [24, 32, 40];

/// Highest quantizer libx265 accepts
pub const MAX_QP: u8 = 51;

/// A validated x265 quantization parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u8")]
pub struct Qp(u8);

impl Qp {
    pub fn new(value: u32) -> Result<Self, SweepError> {
        if value > MAX_QP as u32 {
            return Err(SweepError::QpOutOfRange(value));
        }
        Ok(Qp(value as u8))
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl TryFrom<u32> for Qp {
    type Error = SweepError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Qp::new(value)
    }
}

impl From<Qp> for u8 {
    fn from(qp: Qp) -> Self {
        qp.0
    }
}

impl fmt::Display for Qp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Parse a comma-separated QP list such as "24, 32,40"
pub fn parse_qp_list(input: &str) -> Result<Vec<u32>, SweepError> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<u32>().map_err(|_| SweepError::InvalidQp(s.to_string())))
        .collect()
}

/// Validate a QP list, keeping the caller's order.
///
/// Rejects an empty list, values above [`MAX_QP`] and repeated values.
pub fn validate_qp_list<T>(values: &[T]) -> Result<Vec<Qp>, SweepError>
where
    T: Copy + Into<u32>,
{
    if values.is_empty() {
        return Err(SweepError::EmptyQpList);
    }

    let mut qps: Vec<Qp> = Vec::with_capacity(values.len());
    for &value in values {
        let qp = Qp::new(value.into())?;
        if qps.contains(&qp) {
            return Err(SweepError::DuplicateQp(qp.value()));
        }
        qps.push(qp);
    }

    Ok(qps)
}
