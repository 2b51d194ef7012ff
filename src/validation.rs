// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Field-level validation of incoming project payloads.
//!
//! Each validator collects every problem into a [`FieldErrors`] map (field →
//! messages) rather than stopping at the first, and on success hands back a
//! typed value the service layer can trust.

use url::Url;

use crate::error::FieldErrors;
use crate::models::{
    Coordinate, ProjectType, ReviewProjectRequest, SubmitProjectRequest, VerificationStatus,
    WalletAddress,
};

const NAME_MIN: usize = 3;
const NAME_MAX: usize = 200;
const DESCRIPTION_MAX: usize = 2000;
const COUNTRY_MAX: usize = 100;
const REASON_MAX: usize = 500;

/// A submission whose fields passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidSubmission {
    pub wallet_address: String,
    pub name: String,
    pub description: Option<String>,
    pub project_type: ProjectType,
    pub country: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub api_endpoint: Option<String>,
    pub signature: String,
    pub timestamp: i64,
}

/// A review decision whose fields passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidReview {
    pub reviewer_wallet: String,
    pub status: VerificationStatus,
    pub reason: Option<String>,
    pub signature: String,
    pub timestamp: i64,
}

#[derive(Default)]
struct Collector {
    errors: FieldErrors,
}

impl Collector {
    fn push(&mut self, field: &str, message: impl Into<String>) {
        self.errors
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    fn required<T>(&mut self, field: &str, value: Option<T>) -> Option<T> {
        if value.is_none() {
            self.push(field, "Required");
        }
        value
    }

    fn length(&mut self, field: &str, value: &str, min: usize, max: usize) {
        let len = value.chars().count();
        if len < min {
            self.push(field, format!("String must contain at least {min} character(s)"));
        }
        if len > max {
            self.push(field, format!("String must contain at most {max} character(s)"));
        }
    }

    fn wallet(&mut self, field: &str, value: Option<String>) -> Option<String> {
        let value = self.required(field, value)?;
        if !WalletAddress::is_well_formed(&value) {
            self.push(field, "Invalid wallet address");
        }
        Some(value)
    }

    fn signature(&mut self, value: Option<String>) -> Option<String> {
        let value = self.required("signature", value)?;
        self.length("signature", &value, 1, usize::MAX);
        Some(value)
    }

    fn coordinate(
        &mut self,
        field: &str,
        value: Option<Coordinate>,
        bound: f64,
        label: &str,
    ) -> Option<f64> {
        let number = match value? {
            Coordinate::Number(n) => n,
            Coordinate::Text(text) => match text.trim().parse::<f64>() {
                Ok(n) if !n.is_nan() => n,
                _ => {
                    self.push(field, format!("Invalid {}", label.to_lowercase()));
                    return None;
                }
            },
        };
        if !(-bound..=bound).contains(&number) {
            self.push(field, format!("{label} out of range"));
            return None;
        }
        Some(number)
    }

    fn finish<T>(self, value: Option<T>) -> Result<T, FieldErrors> {
        match value {
            Some(v) if self.errors.is_empty() => Ok(v),
            _ => Err(self.errors),
        }
    }
}

/// Validate a project submission.
pub fn validate_submission(req: SubmitProjectRequest) -> Result<ValidSubmission, FieldErrors> {
    let mut c = Collector::default();

    let wallet_address = c.wallet("walletAddress", req.wallet_address);

    let name = c.required("name", req.name);
    if let Some(name) = &name {
        c.length("name", name, NAME_MIN, NAME_MAX);
    }

    if let Some(description) = &req.description {
        c.length("description", description, 0, DESCRIPTION_MAX);
    }

    let project_type = c
        .required("type", req.project_type)
        .and_then(|raw| match ProjectType::parse(&raw) {
            Some(t) => Some(t),
            None => {
                let expected = ProjectType::ALL
                    .iter()
                    .map(|t| format!("'{t}'"))
                    .collect::<Vec<_>>()
                    .join(" | ");
                c.push(
                    "type",
                    format!("Invalid enum value. Expected {expected}, received '{raw}'"),
                );
                None
            }
        });

    if let Some(country) = &req.country {
        c.length("country", country, 0, COUNTRY_MAX);
    }

    let lat = c.coordinate("lat", req.lat, 90.0, "Latitude");
    let lng = c.coordinate("lng", req.lng, 180.0, "Longitude");

    let api_endpoint = req.api_endpoint.filter(|url| !url.is_empty());
    if let Some(url) = &api_endpoint {
        if Url::parse(url).is_err() {
            c.push("apiEndpoint", "Invalid URL");
        }
    }

    let signature = c.signature(req.signature);
    let timestamp = c.required("timestamp", req.timestamp);

    let valid = (|| {
        Some(ValidSubmission {
            wallet_address: wallet_address?,
            name: name?,
            description: req.description,
            project_type: project_type?,
            country: req.country,
            lat,
            lng,
            api_endpoint,
            signature: signature?,
            timestamp: timestamp?,
        })
    })();
    c.finish(valid)
}

/// Validate an admin review decision.
pub fn validate_review(req: ReviewProjectRequest) -> Result<ValidReview, FieldErrors> {
    let mut c = Collector::default();

    let reviewer_wallet = c.wallet("reviewerWallet", req.reviewer_wallet);

    let status = c
        .required("status", req.status)
        .and_then(|raw| match VerificationStatus::parse(&raw) {
            Some(s) => Some(s),
            None => {
                c.push(
                    "status",
                    format!(
                        "Invalid enum value. Expected 'pending' | 'verified' | 'rejected', received '{raw}'"
                    ),
                );
                None
            }
        });

    if let Some(reason) = &req.reason {
        c.length("reason", reason, 0, REASON_MAX);
    }

    let signature = c.signature(req.signature);
    let timestamp = c.required("timestamp", req.timestamp);

    let valid = (|| {
        Some(ValidReview {
            reviewer_wallet: reviewer_wallet?,
            status: status?,
            reason: req.reason,
            signature: signature?,
            timestamp: timestamp?,
        })
    })();
    c.finish(valid)
}

#[cfg(test)]
mod tests {
    use super::*;

    const WALLET: &str = "0x742d35Cc6634C0532925a3b844Bc9e7595f4aB12";

    fn submission() -> SubmitProjectRequest {
        SubmitProjectRequest {
            wallet_address: Some(WALLET.into()),
            name: Some("Amazon Reforestation".into()),
            description: Some("Native species planting".into()),
            project_type: Some("reforestation".into()),
            country: Some("Brazil".into()),
            lat: Some(Coordinate::Number(-3.4653)),
            lng: Some(Coordinate::Text(" -62.2159 ".into())),
            api_endpoint: Some(String::new()),
            signature: Some("0xdeadbeef".into()),
            timestamp: Some(1_700_000_000_000),
        }
    }

    #[test]
    fn accepts_well_formed_submission() {
        let valid = validate_submission(submission()).unwrap();
        assert_eq!(valid.project_type, ProjectType::Reforestation);
        assert_eq!(valid.lat, Some(-3.4653));
        assert_eq!(valid.lng, Some(-62.2159));
        assert_eq!(valid.api_endpoint, None, "empty endpoint is treated as absent");
    }

    #[test]
    fn reports_every_bad_field() {
        let req = SubmitProjectRequest {
            wallet_address: Some("0x123".into()),
            name: Some("ab".into()),
            project_type: Some("mining".into()),
            lat: Some(Coordinate::Number(91.0)),
            lng: Some(Coordinate::Text("east".into())),
            api_endpoint: Some("not a url".into()),
            signature: Some(String::new()),
            timestamp: None,
            ..submission()
        };

        let errors = validate_submission(req).unwrap_err();
        assert_eq!(errors["walletAddress"], vec!["Invalid wallet address"]);
        assert_eq!(
            errors["name"],
            vec!["String must contain at least 3 character(s)"]
        );
        assert!(errors["type"][0].contains("received 'mining'"));
        assert_eq!(errors["lat"], vec!["Latitude out of range"]);
        assert_eq!(errors["lng"], vec!["Invalid longitude"]);
        assert_eq!(errors["apiEndpoint"], vec!["Invalid URL"]);
        assert!(errors.contains_key("signature"));
        assert_eq!(errors["timestamp"], vec!["Required"]);
    }

    #[test]
    fn missing_required_fields() {
        let errors = validate_submission(SubmitProjectRequest::default()).unwrap_err();
        for field in ["walletAddress", "name", "type", "signature", "timestamp"] {
            assert_eq!(errors[field], vec!["Required"], "{field}");
        }
        assert!(!errors.contains_key("lat"));
    }

    #[test]
    fn length_limits() {
        let req = SubmitProjectRequest {
            name: Some("x".repeat(201)),
            description: Some("d".repeat(2001)),
            country: Some("c".repeat(101)),
            ..submission()
        };
        let errors = validate_submission(req).unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn review_requires_known_status() {
        let req = ReviewProjectRequest {
            reviewer_wallet: Some(WALLET.into()),
            status: Some("approved".into()),
            reason: None,
            signature: Some("0x01".into()),
            timestamp: Some(1),
        };
        let errors = validate_review(req).unwrap_err();
        assert!(errors["status"][0].contains("received 'approved'"));
    }

    #[test]
    fn review_accepts_decision() {
        let req = ReviewProjectRequest {
            reviewer_wallet: Some(WALLET.into()),
            status: Some("verified".into()),
            reason: Some("Field audit passed".into()),
            signature: Some("0x01".into()),
            timestamp: Some(1),
        };
        let review = validate_review(req).unwrap();
        assert_eq!(review.status, VerificationStatus::Verified);
    }
}
