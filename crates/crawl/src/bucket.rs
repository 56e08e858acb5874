// ┏━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━┓
// ┃ Module: bucket                                                      ┃
// ┃ Purpose: Recency classes driving crawl scheduling                   ┃
// ┃ Author: EricA1019                                                   ┃
// ┃ Last Updated: 2025-09-04                                           ┃
// ┗━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━┛

use std::time::{SystemTime, UNIX_EPOCH};

const DAY_SECS: i64 = 86_400;

/// Age class of a file at crawl time. Not persisted; scheduling only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Recency {
    Days90,
    Days180,
    Days365,
    Older,
}

impl Recency {
    pub const COUNT: usize = 4;

    /// Files stamped in the future land in the freshest bucket.
    pub fn of(now: i64, mtime: i64) -> Self {
        let age = now - mtime;
        if age <= 90 * DAY_SECS {
            Recency::Days90
        } else if age <= 180 * DAY_SECS {
            Recency::Days180
        } else if age <= 365 * DAY_SECS {
            Recency::Days365
        } else {
            Recency::Older
        }
    }

    pub fn index(self) -> usize {
        match self {
            Recency::Days90 => 0,
            Recency::Days180 => 1,
            Recency::Days365 => 2,
            Recency::Older => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Recency::Days90 => "90d",
            Recency::Days180 => "180d",
            Recency::Days365 => "365d",
            Recency::Older => "older",
        }
    }
}

pub fn unix_now() -> i64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs() as i64).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucket_edges() {
        let now = 1_000 * DAY_SECS;
        assert_eq!(Recency::of(now, now), Recency::Days90);
        assert_eq!(Recency::of(now, now - 90 * DAY_SECS), Recency::Days90);
        assert_eq!(Recency::of(now, now - 90 * DAY_SECS - 1), Recency::Days180);
        assert_eq!(Recency::of(now, now - 180 * DAY_SECS), Recency::Days180);
        assert_eq!(Recency::of(now, now - 365 * DAY_SECS), Recency::Days365);
        assert_eq!(Recency::of(now, now - 365 * DAY_SECS - 1), Recency::Older);
        assert_eq!(Recency::of(now, now + DAY_SECS), Recency::Days90);
    }

    #[test]
    fn index_round_trip() {
        for (i, r) in [Recency::Days90, Recency::Days180, Recency::Days365, Recency::Older]
            .into_iter()
            .enumerate()
        {
            assert_eq!(r.index(), i);
        }
    }
}

//EOF
