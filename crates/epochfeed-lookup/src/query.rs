//! What a lookup is looking for.

use epochfeed_core::{CoreError, Epoch, Feed, Values};

use crate::error::Result;

/// A feed lookup request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Query {
    pub feed: Feed,
    /// Latest acceptable update time, in unix seconds. Zero means "now".
    pub time_limit: u64,
    /// Epoch of a previously seen update, or [`Epoch::NO_CLUE`].
    pub hint: Epoch,
}

impl Query {
    /// The latest update of `feed`.
    pub fn latest(feed: Feed) -> Self {
        Self {
            feed,
            time_limit: 0,
            hint: Epoch::NO_CLUE,
        }
    }

    /// The update of `feed` that was current at `time`.
    pub fn at(feed: Feed, time: u64) -> Self {
        Self {
            feed,
            time_limit: time,
            hint: Epoch::NO_CLUE,
        }
    }

    pub fn with_hint(mut self, hint: Epoch) -> Self {
        self.hint = hint;
        self
    }

    /// Parse `time`, `hint.time` and `hint.level` plus the feed fields.
    /// Missing numbers default to zero.
    pub fn from_values(values: &Values) -> Result<Self> {
        let feed = Feed::from_values(values)?;
        let time_limit = parse_number(values, "time")?;
        let hint = Epoch::new(
            parse_number(values, "hint.time")?,
            parse_number(values, "hint.level")?,
        );
        Ok(Self {
            feed,
            time_limit,
            hint,
        })
    }

    /// Write this query into `values`; zero fields are omitted.
    pub fn append_values(&self, values: &mut Values) {
        self.feed.append_values(values);
        if self.time_limit != 0 {
            values.set("time", self.time_limit.to_string());
        }
        if self.hint != Epoch::NO_CLUE {
            values.set("hint.time", self.hint.time.to_string());
            values.set("hint.level", self.hint.level.to_string());
        }
    }
}

fn parse_number<N: std::str::FromStr + Default>(values: &Values, key: &str) -> Result<N> {
    match values.get(key) {
        None => Ok(N::default()),
        Some(raw) => raw.parse().map_err(|_| {
            CoreError::InvalidValue(format!("invalid {}: {:?} is not a number", key, raw)).into()
        }),
    }
}
