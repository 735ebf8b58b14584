use anyhow::{Context, Result, bail, ensure};
use std::collections::HashSet;

pub const DEFAULT_SEED: u64 = 1337;
const MAX_RANGE_LEN: u64 = 10_000;

/// Seed resolved from one CLI token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedInfo {
    pub seed: u64,
    /// Token the seed was written as, when it was not a plain decimal.
    pub source: Option<String>,
}

impl SeedInfo {
    #[must_use]
    pub const fn from_numeric(seed: u64) -> Self {
        Self { seed, source: None }
    }

    #[must_use]
    pub fn with_source(seed: u64, source: &str) -> Self {
        Self {
            seed,
            source: Some(source.to_string()),
        }
    }

    /// Short label for reports: the token as written, or the decimal value.
    #[must_use]
    pub fn label(&self) -> String {
        self.source
            .clone()
            .unwrap_or_else(|| self.seed.to_string())
    }
}

/// Resolve a list of CLI seed arguments into canonical seeds.
///
/// Supports decimal integers (negative values use their magnitude),
/// `0x` hexadecimal, and ranges written `A..B` or `A..=B`. Duplicates
/// keep their first position; an empty list yields [`DEFAULT_SEED`].
pub fn resolve_seed_inputs(tokens: &[String]) -> Result<Vec<SeedInfo>> {
    let mut pending = Vec::new();

    for token in tokens {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        if let Some((first, last)) = parse_range(token)? {
            pending.extend((first..=last).map(SeedInfo::from_numeric));
            continue;
        }
        let seed = parse_single(token)?;
        if token.parse::<i64>().is_ok() || token.parse::<u64>().is_ok() {
            pending.push(SeedInfo::from_numeric(seed));
        } else {
            pending.push(SeedInfo::with_source(seed, token));
        }
    }

    let mut seen = HashSet::new();
    let mut deduped: Vec<SeedInfo> = pending
        .into_iter()
        .filter(|info| seen.insert(info.seed))
        .collect();

    if deduped.is_empty() {
        deduped.push(SeedInfo::from_numeric(DEFAULT_SEED));
    }

    Ok(deduped)
}

/// Inclusive bounds of an `A..B` or `A..=B` token, or `None` if the token
/// is not a range.
fn parse_range(token: &str) -> Result<Option<(u64, u64)>> {
    let (start, end, inclusive) = if let Some((start, end)) = token.split_once("..=") {
        (start, end, true)
    } else if let Some((start, end)) = token.split_once("..") {
        (start, end, false)
    } else {
        return Ok(None);
    };
    let first = parse_single(start).with_context(|| format!("range start in {token}"))?;
    let bound = parse_single(end).with_context(|| format!("range end in {token}"))?;
    let last = if inclusive {
        bound
    } else {
        bound
            .checked_sub(1)
            .filter(|last| *last >= first)
            .with_context(|| format!("empty seed range: {token}"))?
    };
    ensure!(first <= last, "empty seed range: {token}");
    ensure!(
        last - first < MAX_RANGE_LEN,
        "seed range {token} expands to more than {MAX_RANGE_LEN} seeds"
    );
    Ok(Some((first, last)))
}

fn parse_single(token: &str) -> Result<u64> {
    let token = token.trim();
    if let Ok(value) = token.parse::<i64>() {
        return Ok(value.unsigned_abs());
    }
    if let Ok(value) = token.parse::<u64>() {
        return Ok(value);
    }
    if let Some(hex) = token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
    {
        return u64::from_str_radix(hex, 16).with_context(|| format!("bad hex seed: {token}"));
    }
    bail!("Unrecognized seed token: {token}")
}
