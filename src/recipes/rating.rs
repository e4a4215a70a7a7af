use serde::Serialize;

use crate::error::ValidationError;

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

/// Running average of all ratings plus how many went into it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RatingAggregate {
    pub average: f64,
    pub count: i64,
}

impl RatingAggregate {
    /// Missing values count as an unrated recipe.
    pub fn from_stored(average: Option<f64>, count: Option<i64>) -> Self {
        Self {
            average: average.unwrap_or(0.0),
            count: count.unwrap_or(0),
        }
    }

    /// Folds one client's rating in. `previous` is what that same client
    /// rated before, in which case the count stays and the old rating is
    /// swapped out of the total.
    pub fn apply(self, rating: u8, previous: Option<u8>) -> Result<Self, ValidationError> {
        check(rating)?;

        match previous {
            Some(previous) => {
                check(previous)?;
                let divisor = self.count.max(1) as f64;
                let total = self.average * divisor;
                Ok(Self {
                    average: (total - f64::from(previous) + f64::from(rating)) / divisor,
                    count: self.count,
                })
            }
            None => {
                let count = self.count + 1;
                Ok(Self {
                    average: (self.average * self.count as f64 + f64::from(rating)) / count as f64,
                    count,
                })
            }
        }
    }
}

fn check(rating: u8) -> Result<(), ValidationError> {
    if (MIN_RATING..=MAX_RATING).contains(&rating) {
        Ok(())
    } else {
        Err(ValidationError::RatingOutOfRange(rating))
    }
}
