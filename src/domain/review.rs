use bigdecimal::{BigDecimal, RoundingMode};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::errors::DomainError;

pub const MIN_RATING: i32 = 1;
pub const MAX_RATING: i32 = 5;

/// Review fields as submitted; both may be missing from the request body.
#[derive(Debug, Clone, Default)]
pub struct ReviewInput {
    pub rating: Option<i32>,
    pub comment: Option<String>,
}

impl ReviewInput {
    /// Returns the rating and the trimmed comment.
    pub fn validate(&self) -> Result<(i32, String), DomainError> {
        let rating = match self.rating {
            Some(r) if (MIN_RATING..=MAX_RATING).contains(&r) => r,
            Some(r) => {
                return Err(DomainError::Validation(format!(
                    "rating must be between {MIN_RATING} and {MAX_RATING}, got {r}"
                )))
            }
            None => return Err(DomainError::Validation("rating is required".to_string())),
        };

        let comment = self
            .comment
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or_else(|| DomainError::Validation("comment is required".to_string()))?;

        Ok((rating, comment.to_string()))
    }
}

#[derive(Debug, Clone)]
pub struct NewReview {
    pub product_id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub rating: i32,
    pub comment: String,
}

#[derive(Debug, Clone)]
pub struct ReviewView {
    pub id: Uuid,
    pub product_id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub rating: i32,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

/// Mean of the given ratings at two decimal places, rounding half up.
/// An empty set averages to zero.
pub fn average_rating(ratings: &[i32]) -> BigDecimal {
    if ratings.is_empty() {
        return BigDecimal::from(0).with_scale(2);
    }
    let sum: i64 = ratings.iter().map(|&r| i64::from(r)).sum();
    let mean = BigDecimal::from(sum) / BigDecimal::from(ratings.len() as i64);
    mean.with_scale_round(2, RoundingMode::HalfUp)
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn input(rating: Option<i32>, comment: Option<&str>) -> ReviewInput {
        ReviewInput {
            rating,
            comment: comment.map(str::to_string),
        }
    }

    #[test]
    fn average_of_two_four_five_rounds_to_three_sixty_seven() {
        assert_eq!(
            average_rating(&[2, 4, 5]),
            BigDecimal::from_str("3.67").unwrap()
        );
    }

    #[test]
    fn average_of_four_and_five_is_four_fifty() {
        assert_eq!(
            average_rating(&[4, 5]),
            BigDecimal::from_str("4.50").unwrap()
        );
    }

    #[test]
    fn average_of_nothing_is_zero() {
        assert_eq!(average_rating(&[]), BigDecimal::from(0));
    }

    #[test]
    fn average_rounds_half_up() {
        // 1 + 1 + 1 + 1 + 1 + 1 + 1 + 2 = 9 over 8 = 1.125
        assert_eq!(
            average_rating(&[1, 1, 1, 1, 1, 1, 1, 2]),
            BigDecimal::from_str("1.13").unwrap()
        );
    }

    #[test]
    fn valid_input_is_trimmed() {
        let (rating, comment) = input(Some(5), Some("  Great product \n"))
            .validate()
            .unwrap();
        assert_eq!(rating, 5);
        assert_eq!(comment, "Great product");
    }

    #[test]
    fn zero_rating_is_rejected() {
        assert!(matches!(
            input(Some(0), Some("Not so good")).validate(),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn rating_above_five_is_rejected() {
        assert!(matches!(
            input(Some(6), Some("Too good")).validate(),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn missing_rating_is_rejected() {
        assert!(matches!(
            input(None, Some("Nice product")).validate(),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn blank_comment_is_rejected() {
        assert!(matches!(
            input(Some(4), Some("   ")).validate(),
            Err(DomainError::Validation(_))
        ));
        assert!(matches!(
            input(Some(4), None).validate(),
            Err(DomainError::Validation(_))
        ));
    }
}
