use std::fmt;
use std::num::NonZeroUsize;
use std::str::FromStr;
use std::time::Duration;

/// Shape of the value a node produces.
///
/// - `Scalar`: one value per execution.
/// - `Streaming`: a sequence per execution; each element is routed to the
///   outgoing edges as an independent item, in emission order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputKind {
    #[default]
    Scalar,
    Streaming,
}

impl fmt::Display for OutputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputKind::Scalar => f.write_str("scalar"),
            OutputKind::Streaming => f.write_str("streaming"),
        }
    }
}

/// Upper bound on simultaneously running node executions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConcurrencyLimit {
    Bounded(NonZeroUsize),
    Unbounded,
}

impl ConcurrencyLimit {
    pub const DEFAULT_LIMIT: usize = 10;

    /// Whether `in_flight` running tasks leave room for one more.
    pub fn allows(&self, in_flight: usize) -> bool {
        match self {
            ConcurrencyLimit::Bounded(cap) => in_flight < cap.get(),
            ConcurrencyLimit::Unbounded => true,
        }
    }
}

impl Default for ConcurrencyLimit {
    fn default() -> Self {
        ConcurrencyLimit::Bounded(
            NonZeroUsize::new(Self::DEFAULT_LIMIT).unwrap_or(NonZeroUsize::MIN),
        )
    }
}

impl fmt::Display for ConcurrencyLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConcurrencyLimit::Bounded(cap) => write!(f, "{cap}"),
            ConcurrencyLimit::Unbounded => f.write_str("unbounded"),
        }
    }
}

impl FromStr for ConcurrencyLimit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        if s == "unbounded" || s == "none" {
            return Ok(ConcurrencyLimit::Unbounded);
        }

        let value: usize = s.parse().map_err(|e| {
            format!("invalid concurrency '{s}': {e} (expected a positive number or \"unbounded\")")
        })?;

        NonZeroUsize::new(value)
            .map(ConcurrencyLimit::Bounded)
            .ok_or_else(|| "concurrency must be >= 1 (got 0)".to_string())
    }
}

/// Parse a duration like `"500ms"`, `"5s"`, `"2m"` or `"1h"`.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    let idx = s
        .chars()
        .position(|c| !c.is_ascii_digit())
        .ok_or_else(|| format!("duration '{s}' is missing a unit suffix"))?;

    let (num_part, unit_part) = s.split_at(idx);
    let value: u64 = num_part
        .parse()
        .map_err(|e| format!("invalid duration number '{num_part}': {e}"))?;

    let secs_per_unit = match unit_part.trim().to_lowercase().as_str() {
        "ms" => return Ok(Duration::from_millis(value)),
        "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        unit => {
            return Err(format!(
                "unsupported duration unit '{unit}'; expected ms, s, m, or h"
            ));
        }
    };

    value
        .checked_mul(secs_per_unit)
        .map(Duration::from_secs)
        .ok_or_else(|| format!("duration '{s}' is too large"))
}
