// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Project submission and review.
//!
//! ## Submission
//!
//! 1. Verify the wallet signature (scope `project_submission`)
//! 2. Reject IoT endpoints aimed at internal networks
//! 3. Resolve or create the owner by wallet
//! 4. Strip markup from name and description
//! 5. Persist the project as `pending`
//!
//! ## Review
//!
//! 1. Verify the reviewer signature (scope `project_review`)
//! 2. Require the reviewer to hold the admin role
//! 3. Apply the transition and write the audit row atomically

use std::sync::Arc;

use chrono::Utc;
use serde_json::{json, Map, Value};

use crate::auth::{AuthError, AuthRequest, Role, Scope, SignatureVerifier};
use crate::error::AppError;
use crate::security::{ensure_safe_endpoint, sanitize_rich_text};
use crate::storage::repository::{NewProject, StatusUpdate, StoredProject};
use crate::storage::Database;
use crate::validation::{ValidReview, ValidSubmission};

#[derive(Clone)]
pub struct ProjectService {
    db: Arc<Database>,
    verifier: SignatureVerifier,
}

impl ProjectService {
    pub fn new(db: Arc<Database>, verifier: SignatureVerifier) -> Self {
        Self { db, verifier }
    }

    fn authenticate(&self, request: AuthRequest) -> Result<(), AuthError> {
        self.verifier.verify(&request).inspect_err(|e| {
            tracing::info!(
                wallet = %request.wallet_address,
                scope = %request.scope,
                code = e.error_code(),
                "Signed request rejected"
            );
        })
    }

    /// Create a project from a validated, signed submission.
    pub fn create_project(&self, submission: ValidSubmission) -> Result<StoredProject, AppError> {
        let metadata = submission_metadata(&submission);
        self.authenticate(AuthRequest {
            wallet_address: submission.wallet_address.clone(),
            signature: submission.signature,
            timestamp: Some(submission.timestamp),
            scope: Scope::Submission,
        })?;

        if let Some(endpoint) = &submission.api_endpoint {
            ensure_safe_endpoint(endpoint)?;
        }

        let owner = self.db.users().get_or_create(&submission.wallet_address)?;

        let project = self.db.projects().create(NewProject {
            owner_id: owner.id,
            name: sanitize_rich_text(&submission.name),
            description: submission
                .description
                .as_deref()
                .filter(|d| !d.is_empty())
                .map(sanitize_rich_text),
            project_type: submission.project_type,
            country: submission.country,
            latitude: submission.lat,
            longitude: submission.lng,
            api_endpoint: submission.api_endpoint,
            metadata,
        })?;

        tracing::info!(
            project_id = project.id,
            owner = %owner.wallet_address,
            project_type = %project.project_type,
            "Project submitted"
        );
        Ok(project)
    }

    /// Apply an admin decision to a project.
    pub fn update_status(
        &self,
        project_id: u64,
        review: ValidReview,
    ) -> Result<StoredProject, AppError> {
        self.authenticate(AuthRequest {
            wallet_address: review.reviewer_wallet.clone(),
            signature: review.signature,
            timestamp: Some(review.timestamp),
            scope: Scope::Review,
        })?;

        let reviewer = self
            .db
            .users()
            .find_by_wallet(&review.reviewer_wallet)?
            .filter(|user| user.role.has_privilege(Role::Admin))
            .ok_or_else(|| {
                tracing::warn!(
                    wallet = %review.reviewer_wallet,
                    project_id,
                    "Review attempted without admin role"
                );
                AuthError::InsufficientPermissions
            })?;

        let (project, change) = self.db.projects().update_status(
            project_id,
            StatusUpdate {
                status: review.status,
                reviewer_id: reviewer.id,
                reason: review.reason,
                at: Utc::now(),
            },
        )?;

        tracing::info!(
            project_id,
            change_id = change.id,
            from = ?change.previous_status,
            to = %change.new_status,
            reviewer = %reviewer.wallet_address,
            "Project status changed"
        );
        Ok(project)
    }
}

/// `{projectType, country?, location?}`; location only when both coordinates are given.
fn submission_metadata(submission: &ValidSubmission) -> Value {
    let mut metadata = Map::new();
    metadata.insert("projectType".into(), json!(submission.project_type));
    if let Some(country) = &submission.country {
        metadata.insert("country".into(), json!(country));
    }
    if let (Some(lat), Some(lng)) = (submission.lat, submission.lng) {
        metadata.insert("location".into(), json!({ "lat": lat, "lng": lng }));
    }
    Value::Object(metadata)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::InMemoryReplayStore;
    use crate::models::{ProjectType, VerificationStatus};
    use crate::test_support::{temp_db, TestWallet};
    use axum::http::StatusCode;
    use tempfile::TempDir;

    fn service() -> (ProjectService, Arc<Database>, TempDir) {
        let (db, dir) = temp_db();
        let db = Arc::new(db);
        let verifier = SignatureVerifier::new(Arc::new(InMemoryReplayStore::new()));
        (ProjectService::new(Arc::clone(&db), verifier), db, dir)
    }

    fn now_ms() -> i64 {
        Utc::now().timestamp_millis()
    }

    fn submission(wallet: &TestWallet) -> ValidSubmission {
        let timestamp = now_ms();
        ValidSubmission {
            wallet_address: wallet.address(),
            name: "<script>alert(1)</script>".into(),
            description: Some("Peatland <b onclick=x()>rewetting</b>".into()),
            project_type: ProjectType::Conservation,
            country: Some("Indonesia".into()),
            lat: Some(-2.123_456_789),
            lng: Some(113.9),
            api_endpoint: Some("https://iot.example.org/feed".into()),
            signature: wallet.sign(Scope::Submission, timestamp),
            timestamp,
        }
    }

    fn review(wallet: &TestWallet, status: VerificationStatus, timestamp: i64) -> ValidReview {
        ValidReview {
            reviewer_wallet: wallet.address(),
            status,
            reason: Some("Site audit complete".into()),
            signature: wallet.sign(Scope::Review, timestamp),
            timestamp,
        }
    }

    #[test]
    fn submission_persists_sanitized_pending_project() {
        let (service, db, _dir) = service();
        let wallet = TestWallet::primary();

        let project = service.create_project(submission(&wallet)).unwrap();

        assert_eq!(project.verification_status, VerificationStatus::Pending);
        assert!(!project.name.contains('<') && !project.name.contains('>'));
        assert_eq!(project.description.as_deref(), Some("Peatland b x()rewetting/b"));
        assert_eq!(project.latitude, Some(-2.123457));
        assert_eq!(project.metadata["projectType"], "conservation");
        assert_eq!(project.metadata["country"], "Indonesia");
        assert_eq!(project.metadata["location"]["lng"], 113.9);

        let owner = db.users().find_by_wallet(&wallet.address()).unwrap().unwrap();
        assert_eq!(owner.id, project.owner_id);
        assert_eq!(db.projects().get(project.id).unwrap(), project);
    }

    #[test]
    fn replayed_submission_is_rejected() {
        let (service, _db, _dir) = service();
        let wallet = TestWallet::primary();
        let payload = submission(&wallet);

        service.create_project(payload.clone()).unwrap();
        let err = service.create_project(payload).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.to_string(), "Signature already used");
    }

    #[test]
    fn internal_endpoint_is_rejected_before_any_write() {
        let (service, db, _dir) = service();
        let wallet = TestWallet::primary();
        let payload = ValidSubmission {
            api_endpoint: Some("https://169.254.169.254/latest".into()),
            ..submission(&wallet)
        };

        let err = service.create_project(payload).unwrap_err();
        assert_eq!(err.to_string(), "IoT endpoint cannot target internal networks");
        assert!(db.users().find_by_wallet(&wallet.address()).unwrap().is_none());
    }

    #[test]
    fn metadata_omits_partial_location() {
        let wallet = TestWallet::primary();
        let payload = ValidSubmission {
            lng: None,
            country: None,
            ..submission(&wallet)
        };
        let metadata = submission_metadata(&payload);
        assert!(metadata.get("location").is_none());
        assert!(metadata.get("country").is_none());
    }

    #[test]
    fn admin_can_verify_pending_project_once() {
        let (service, db, _dir) = service();
        let owner = TestWallet::primary();
        let admin = TestWallet::secondary();
        db.users().set_role(&admin.address(), Role::Admin).unwrap();

        let project = service.create_project(submission(&owner)).unwrap();
        let first_at = now_ms();
        let updated = service
            .update_status(project.id, review(&admin, VerificationStatus::Verified, first_at))
            .unwrap();
        assert_eq!(updated.verification_status, VerificationStatus::Verified);
        assert_eq!(updated.metadata["verifiedEmissions"]["verified"], true);

        let history = db.projects().history(project.id).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].reason.as_deref(), Some("Site audit complete"));

        // A fresh signature, so the conflict comes from the status machine
        let err = service
            .update_status(
                project.id,
                review(&admin, VerificationStatus::Rejected, first_at + 1),
            )
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert_eq!(err.code(), "INVALID_STATUS_TRANSITION");
    }

    #[test]
    fn non_admin_reviewer_is_forbidden() {
        let (service, db, _dir) = service();
        let owner = TestWallet::primary();
        let project = service.create_project(submission(&owner)).unwrap();

        let err = service
            .update_status(project.id, review(&owner, VerificationStatus::Verified, now_ms()))
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            db.projects().get(project.id).unwrap().verification_status,
            VerificationStatus::Pending
        );
    }

    #[test]
    fn review_of_missing_project_is_not_found() {
        let (service, db, _dir) = service();
        let admin = TestWallet::secondary();
        db.users().set_role(&admin.address(), Role::Admin).unwrap();

        let err = service
            .update_status(404, review(&admin, VerificationStatus::Verified, now_ms()))
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "Project 404 not found");
    }
}
