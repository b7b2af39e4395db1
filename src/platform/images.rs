//! Linear-learner container image resolution
//!
//! The platform publishes its first-party algorithm containers from a
//! per-region registry account. There is no lookup API, so the published
//! table is embedded here; an unknown region is a hard configuration
//! error rather than a guessed URI.

use crate::error::AppError;

/// Image version tag the pipeline trains and serves with.
const LINEAR_LEARNER_VERSION: &str = "1.5-1";

/// Region -> registry account for the first-party algorithm images.
const ALGORITHM_REGISTRIES: &[(&str, &str)] = &[
    ("ap-northeast-1", "351501993468"),
    ("ap-northeast-2", "835164637446"),
    ("ap-south-1", "991648021394"),
    ("ap-southeast-1", "475088953585"),
    ("ap-southeast-2", "712309505854"),
    ("ca-central-1", "469771592824"),
    ("eu-central-1", "664544806723"),
    ("eu-north-1", "669576153137"),
    ("eu-west-1", "438346466558"),
    ("eu-west-2", "644912444149"),
    ("sa-east-1", "855470959533"),
    ("us-east-1", "382416733822"),
    ("us-east-2", "404615174143"),
    ("us-west-1", "632365934929"),
    ("us-west-2", "174872318107"),
];

/// Resolve the linear-learner training/serving image URI for a region.
pub fn linear_learner_image(region: &str) -> Result<String, AppError> {
    let account = ALGORITHM_REGISTRIES
        .iter()
        .find(|(r, _)| *r == region)
        .map(|(_, account)| *account)
        .ok_or_else(|| {
            AppError::Config(format!(
                "no linear-learner registry known for region '{}'",
                region
            ))
        })?;

    Ok(format!(
        "{}.dkr.ecr.{}.amazonaws.com/linear-learner:{}",
        account, region, LINEAR_LEARNER_VERSION
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_known_region() {
        let uri = linear_learner_image("ap-southeast-1").unwrap();
        assert_eq!(
            uri,
            "475088953585.dkr.ecr.ap-southeast-1.amazonaws.com/linear-learner:1.5-1"
        );
    }

    #[test]
    fn unknown_region_is_a_config_error() {
        let err = linear_learner_image("mars-north-1").unwrap_err();
        assert!(err.to_string().contains("mars-north-1"));
    }
}
