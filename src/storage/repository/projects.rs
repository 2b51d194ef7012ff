// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Project repository.
//!
//! Projects get serial ids from the `projects` sequence. Every status change
//! writes the new project row and its audit row in the same transaction.

use chrono::{DateTime, Utc};
use redb::{ReadableDatabase, ReadableTable};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use utoipa::ToSchema;

use super::super::database::{
    next_id, Database, DbError, DbResult, PROJECTS, PROJECTS_BY_OWNER, PROJECT_SEQUENCE,
    PROJECT_STATUS_HISTORY, STATUS_CHANGE_SEQUENCE,
};
use crate::models::{ProjectType, VerificationStatus};

/// Carbon project as persisted.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StoredProject {
    pub id: u64,
    /// Owning user id
    pub owner_id: String,
    pub name: String,
    pub description: Option<String>,
    pub project_type: ProjectType,
    pub country: Option<String>,
    /// Degrees, rounded to 6 decimals
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub api_endpoint: Option<String>,
    /// Free-form metadata (`projectType`, `country`, `location`,
    /// `verifiedEmissions`)
    #[schema(value_type = Object)]
    pub metadata: Value,
    pub verification_status: VerificationStatus,
    pub status_reason: Option<String>,
    pub status_changed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Audit row for one status change.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StoredStatusChange {
    pub id: u64,
    pub project_id: u64,
    pub previous_status: Option<VerificationStatus>,
    pub new_status: VerificationStatus,
    /// User id of the admin who made the change
    pub reviewer_id: Option<String>,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Map pin for a verified project.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectLocation {
    pub id: u64,
    pub name: String,
    pub project_type: ProjectType,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[schema(value_type = Object)]
    pub metadata: Value,
}

/// Fields of a project about to be created.
#[derive(Debug, Clone)]
pub struct NewProject {
    pub owner_id: String,
    pub name: String,
    pub description: Option<String>,
    pub project_type: ProjectType,
    pub country: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub api_endpoint: Option<String>,
    pub metadata: Value,
}

/// A requested status change.
#[derive(Debug, Clone)]
pub struct StatusUpdate {
    pub status: VerificationStatus,
    pub reviewer_id: String,
    pub reason: Option<String>,
    pub at: DateTime<Utc>,
}

pub struct ProjectRepository<'a> {
    db: &'a Database,
}

impl<'a> ProjectRepository<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Insert a new project in `pending` state.
    pub fn create(&self, new: NewProject) -> DbResult<StoredProject> {
        let now = Utc::now();
        let write_txn = self.db.raw().begin_write()?;
        let project = {
            let id = next_id(&write_txn, PROJECT_SEQUENCE)?;
            let project = StoredProject {
                id,
                owner_id: new.owner_id,
                name: new.name,
                description: new.description,
                project_type: new.project_type,
                country: new.country,
                latitude: new.latitude.map(round_coordinate),
                longitude: new.longitude.map(round_coordinate),
                api_endpoint: new.api_endpoint,
                metadata: new.metadata,
                verification_status: VerificationStatus::Pending,
                status_reason: None,
                status_changed_at: None,
                created_at: now,
                updated_at: now,
            };

            let mut projects = write_txn.open_table(PROJECTS)?;
            projects.insert(id, serde_json::to_vec(&project)?.as_slice())?;
            let mut by_owner = write_txn.open_table(PROJECTS_BY_OWNER)?;
            by_owner.insert((project.owner_id.as_str(), id), ())?;
            project
        };
        write_txn.commit()?;
        Ok(project)
    }

    /// Get a project by id.
    pub fn get(&self, id: u64) -> DbResult<StoredProject> {
        let read_txn = self.db.raw().begin_read()?;
        let projects = read_txn.open_table(PROJECTS)?;
        match projects.get(id)? {
            Some(value) => Ok(serde_json::from_slice(value.value())?),
            None => Err(DbError::NotFound(format!("Project {id}"))),
        }
    }

    /// All projects owned by `owner_id`, newest first.
    pub fn list_by_owner(&self, owner_id: &str) -> DbResult<Vec<StoredProject>> {
        let read_txn = self.db.raw().begin_read()?;
        let by_owner = read_txn.open_table(PROJECTS_BY_OWNER)?;
        let projects = read_txn.open_table(PROJECTS)?;

        let mut result = Vec::new();
        for entry in by_owner.range((owner_id, 0u64)..=(owner_id, u64::MAX))?.rev() {
            let (key, _) = entry?;
            let (_, id) = key.value();
            if let Some(value) = projects.get(id)? {
                result.push(serde_json::from_slice(value.value())?);
            }
        }
        Ok(result)
    }

    /// Locations of all verified projects, in id order.
    pub fn verified_locations(&self) -> DbResult<Vec<ProjectLocation>> {
        let read_txn = self.db.raw().begin_read()?;
        let projects = read_txn.open_table(PROJECTS)?;
        let mut result = Vec::new();
        for entry in projects.iter()? {
            let (_, value) = entry?;
            let project: StoredProject = serde_json::from_slice(value.value())?;
            if project.verification_status == VerificationStatus::Verified {
                result.push(ProjectLocation {
                    id: project.id,
                    name: project.name,
                    project_type: project.project_type,
                    latitude: project.latitude,
                    longitude: project.longitude,
                    metadata: project.metadata,
                });
            }
        }
        Ok(result)
    }

    /// Status history of a project, oldest first.
    pub fn history(&self, project_id: u64) -> DbResult<Vec<StoredStatusChange>> {
        let read_txn = self.db.raw().begin_read()?;
        let history = read_txn.open_table(PROJECT_STATUS_HISTORY)?;
        let mut result = Vec::new();
        for entry in history.range((project_id, 0u64)..=(project_id, u64::MAX))? {
            let (_, value) = entry?;
            result.push(serde_json::from_slice(value.value())?);
        }
        Ok(result)
    }

    /// Apply a status change and record it in the history.
    ///
    /// Fails with [`DbError::InvalidTransition`] unless the current status
    /// may move to the requested one. A missing `reason` keeps the previous
    /// one on the project row.
    pub fn update_status(
        &self,
        project_id: u64,
        update: StatusUpdate,
    ) -> DbResult<(StoredProject, StoredStatusChange)> {
        let write_txn = self.db.raw().begin_write()?;
        let result = {
            let mut projects = write_txn.open_table(PROJECTS)?;
            let bytes = projects
                .get(project_id)?
                .map(|v| v.value().to_vec())
                .ok_or_else(|| DbError::NotFound(format!("Project {project_id}")))?;
            let mut project: StoredProject = serde_json::from_slice(&bytes)?;

            let previous = project.verification_status;
            if !previous.can_transition_to(update.status) {
                return Err(DbError::InvalidTransition {
                    from: previous,
                    to: update.status,
                });
            }

            project.verification_status = update.status;
            project.status_reason = update.reason.clone().or(project.status_reason);
            project.status_changed_at = Some(update.at);
            project.updated_at = update.at;
            apply_verified_emissions(&mut project.metadata, update.status, update.at);
            projects.insert(project_id, serde_json::to_vec(&project)?.as_slice())?;

            let change = StoredStatusChange {
                id: next_id(&write_txn, STATUS_CHANGE_SEQUENCE)?,
                project_id,
                previous_status: Some(previous),
                new_status: update.status,
                reviewer_id: Some(update.reviewer_id),
                reason: update.reason,
                created_at: update.at,
            };
            let mut history = write_txn.open_table(PROJECT_STATUS_HISTORY)?;
            history.insert((project_id, change.id), serde_json::to_vec(&change)?.as_slice())?;

            (project, change)
        };
        write_txn.commit()?;
        Ok(result)
    }
}

fn round_coordinate(value: f64) -> f64 {
    (value * 1e6).round() / 1e6
}

/// Set `verifiedEmissions` when verified, keeping any measured values; drop it otherwise.
fn apply_verified_emissions(metadata: &mut Value, status: VerificationStatus, at: DateTime<Utc>) {
    if !metadata.is_object() {
        *metadata = json!({});
    }
    let Some(map) = metadata.as_object_mut() else {
        return;
    };

    if status != VerificationStatus::Verified {
        map.remove("verifiedEmissions");
        return;
    }

    let previous = map.get("verifiedEmissions");
    let field = |name: &str, default: Value| {
        previous
            .and_then(|p| p.get(name))
            .filter(|v| !v.is_null())
            .cloned()
            .unwrap_or(default)
    };
    let record = json!({
        "co2_tons": field("co2_tons", json!(0)),
        "source": field("source", json!("manual_review")),
        "confidence": field("confidence", json!(1.0)),
        "verified": true,
        "timestamp": at.to_rfc3339(),
    });
    map.insert("verifiedEmissions".to_string(), record);
}
