use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GatewayError;

/// Downsampling function applied by the storage tier. Only the name is
/// validated and forwarded here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConsolidationFunction {
    #[default]
    #[serde(rename = "AVERAGE")]
    Average,
    #[serde(rename = "MAX")]
    Max,
    #[serde(rename = "MIN")]
    Min,
}

impl ConsolidationFunction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConsolidationFunction::Average => "AVERAGE",
            ConsolidationFunction::Max => "MAX",
            ConsolidationFunction::Min => "MIN",
        }
    }
}

impl fmt::Display for ConsolidationFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConsolidationFunction {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AVERAGE" => Ok(ConsolidationFunction::Average),
            "MAX" => Ok(ConsolidationFunction::Max),
            "MIN" => Ok(ConsolidationFunction::Min),
            _ => Err(GatewayError::InvalidConsolidation),
        }
    }
}

/// Exact, case-sensitive membership check. No defaulting happens here.
pub fn validate(name: &str) -> bool {
    name.parse::<ConsolidationFunction>().is_ok()
}

/// Request-side policy: an empty token means `AVERAGE`, anything else must
/// validate or the request fails with `invalid_cf`.
pub fn parse_or_default(name: &str) -> Result<ConsolidationFunction, GatewayError> {
    if name.is_empty() {
        return Ok(ConsolidationFunction::default());
    }
    name.parse()
}
