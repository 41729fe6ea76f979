//! # Replay — drive the engine through a YAML scenario.
//!
//! A scenario is an ordered list of steps. Each step runs in its own unit of
//! work against a fresh in-memory store and is committed only when it
//! succeeds. Entities and versions are referred to by symbolic labels.
//!
//! ```yaml
//! steps:
//!   - create: { entity: office, languages: [fi, sv] }
//!     as: v1
//!   - publish: { version: v1 }
//!   - edit: { version: v1 }
//!     as: v2
//!   - force: { version: v1, status: Modified }
//!     expect_error: conflict_in_progress
//!   - resolve: { entity: office, status: Published, expect: v1 }
//! ```
//!
//! A step carrying `expect_error` must fail with that error kind; any other
//! failure aborts the replay.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;
use serde::{Deserialize, Serialize};

use catver_core::{
    LanguageId, PublishingStatus, RootId, Timestamp, ValidityWindow, VersionId,
};
use catver_state::{
    EditMode, EditTarget, InMemoryStore, InMemoryUnitOfWork, Version, VersioningError,
    VersioningManager,
};

use crate::{load_config, Snapshot};

/// Arguments for the `replay` subcommand.
#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// Scenario file (YAML).
    pub scenario: PathBuf,

    /// Print the resulting histories as JSON.
    #[arg(long)]
    pub json: bool,

    /// Write the committed store to this path as a snapshot document.
    #[arg(long)]
    pub snapshot: Option<PathBuf>,
}

// ─── Scenario Document ──────────────────────────────────────────────

/// A replayable scenario.
#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    pub steps: Vec<Step>,
}

impl Scenario {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario: {}", path.display()))?;
        Self::from_yaml(&content)
            .with_context(|| format!("failed to parse scenario: {}", path.display()))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }
}

/// One scenario step.
#[derive(Debug, Clone, Deserialize)]
pub struct Step {
    #[serde(flatten)]
    pub action: Action,
    /// Label bound to the version the step produces.
    #[serde(rename = "as", default)]
    pub label: Option<String>,
    /// Error kind the step must fail with.
    #[serde(default)]
    pub expect_error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Create(CreateStep),
    Edit(EditStep),
    Publish(PublishStep),
    Force(ForceStep),
    Abandon(AbandonStep),
    Resolve(ResolveStep),
    Languages(LanguagesStep),
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateStep {
    pub entity: String,
    #[serde(default)]
    pub languages: Vec<LanguageId>,
    #[serde(default)]
    pub status: Option<PublishingStatus>,
    #[serde(default)]
    pub valid_from: Option<Timestamp>,
    #[serde(default)]
    pub valid_to: Option<Timestamp>,
    #[serde(default)]
    pub content: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EditStep {
    pub version: String,
    #[serde(default)]
    pub keep_previous_state: bool,
    #[serde(default)]
    pub status: Option<PublishingStatus>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PublishStep {
    pub version: String,
    #[serde(default = "published")]
    pub target: PublishingStatus,
}

fn published() -> PublishingStatus {
    PublishingStatus::Published
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForceStep {
    pub version: String,
    pub status: PublishingStatus,
    #[serde(default)]
    pub allowed_from: Option<Vec<PublishingStatus>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AbandonStep {
    pub version: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResolveStep {
    pub entity: String,
    #[serde(default)]
    pub status: Option<PublishingStatus>,
    #[serde(default)]
    pub ignore_tombstoned: Option<bool>,
    /// Resolve as of this instant instead of now.
    #[serde(default)]
    pub at: Option<Timestamp>,
    /// Label of the version the read must see.
    #[serde(default)]
    pub expect: Option<String>,
    /// The read must see nothing.
    #[serde(default)]
    pub expect_missing: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LanguagesStep {
    pub version: String,
    #[serde(default)]
    pub all: Option<PublishingStatus>,
    #[serde(default)]
    pub set: BTreeMap<LanguageId, PublishingStatus>,
    #[serde(default)]
    pub schedule_publish: BTreeMap<LanguageId, Timestamp>,
    #[serde(default)]
    pub schedule_archive: BTreeMap<LanguageId, Timestamp>,
    #[serde(default)]
    pub failed_publish: BTreeMap<LanguageId, Timestamp>,
    /// Apply schedules due at this instant.
    #[serde(default)]
    pub run_due: Option<Timestamp>,
    /// Languages that must be published afterwards.
    #[serde(default)]
    pub expect_available: Option<Vec<LanguageId>>,
}

// ─── Report ─────────────────────────────────────────────────────────

/// One listed version in the replay report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportedVersion {
    pub label: Option<String>,
    pub version_id: VersionId,
    pub status: PublishingStatus,
    pub major: u32,
    pub minor: u32,
}

// ─── Replay ─────────────────────────────────────────────────────────

/// Replay state: the engine, its store, and the label bindings.
pub struct Replay {
    manager: VersioningManager,
    store: InMemoryStore,
    entities: BTreeMap<String, RootId>,
    versions: BTreeMap<String, VersionId>,
}

impl Replay {
    pub fn new(manager: VersioningManager) -> Self {
        Self {
            manager,
            store: InMemoryStore::new(),
            entities: BTreeMap::new(),
            versions: BTreeMap::new(),
        }
    }

    pub fn store(&self) -> &InMemoryStore {
        &self.store
    }

    /// Run every step in order, stopping at the first unexpected outcome.
    pub fn run(&mut self, scenario: &Scenario) -> Result<()> {
        for (index, step) in scenario.steps.iter().enumerate() {
            self.step(step)
                .with_context(|| format!("step {} ({})", index + 1, step.action.name()))?;
        }
        Ok(())
    }

    fn step(&mut self, step: &Step) -> Result<()> {
        let mut uow = self.store.begin();
        let outcome = self.apply(&mut uow, &step.action)?;
        let outcome = outcome.and_then(|produced| {
            uow.commit()?;
            Ok(produced)
        });

        match (outcome, step.expect_error.as_deref()) {
            (Ok(produced), None) => {
                if let (Some(label), Some(id)) = (&step.label, produced) {
                    self.versions.insert(label.clone(), id);
                }
                Ok(())
            }
            (Ok(_), Some(kind)) => bail!("expected {kind} error, but the step succeeded"),
            (Err(e), Some(kind)) if e.kind() == kind => {
                tracing::info!(kind, "step failed as expected");
                Ok(())
            }
            (Err(e), _) => Err(e.into()),
        }
    }

    /// Run one action inside `uow`.
    ///
    /// The outer error is a scenario problem (unknown label, unmet read
    /// expectation); the inner one is the engine's verdict.
    fn apply(
        &mut self,
        uow: &mut InMemoryUnitOfWork,
        action: &Action,
    ) -> Result<Result<Option<VersionId>, VersioningError>> {
        let manager = &self.manager;
        let outcome = match action {
            Action::Create(create) => {
                let version = self.new_version(create)?;
                let root = version.root_id;
                let acquired = manager.acquire_editable_version(
                    uow,
                    EditTarget::New(version),
                    EditMode::Standard,
                    create.status,
                );
                if let (Ok(acquired), None) = (&acquired, root) {
                    if let Some(root) = acquired.version.root_id {
                        self.entities.insert(create.entity.clone(), root);
                    }
                }
                acquired.map(|a| Some(a.version.id))
            }
            Action::Edit(edit) => {
                let id = self.version(&edit.version)?;
                let mode = if edit.keep_previous_state {
                    EditMode::KeepPreviousState
                } else {
                    EditMode::Standard
                };
                manager
                    .acquire_editable_version(uow, EditTarget::Existing(id), mode, edit.status)
                    .map(|a| Some(a.version.id))
            }
            Action::Publish(publish) => {
                let id = self.version(&publish.version)?;
                manager.publish(uow, id, publish.target).map(|_| Some(id))
            }
            Action::Force(force) => {
                let id = self.version(&force.version)?;
                manager
                    .force_status(uow, id, force.status, force.allowed_from.as_deref())
                    .map(|change| change.map(|c| c.version_id))
            }
            Action::Abandon(abandon) => {
                let id = self.version(&abandon.version)?;
                manager.abandon_version(uow, id).map(|c| Some(c.version_id))
            }
            Action::Resolve(resolve) => return self.resolve(uow, resolve),
            Action::Languages(languages) => return self.languages(uow, languages),
        };
        Ok(outcome)
    }

    fn resolve(
        &self,
        uow: &mut InMemoryUnitOfWork,
        step: &ResolveStep,
    ) -> Result<Result<Option<VersionId>, VersioningError>> {
        let root = self.entity(&step.entity)?;
        let found = match self.manager.resolve_version_id_at(
            uow,
            root,
            step.status,
            step.ignore_tombstoned,
            step.at.unwrap_or_else(Timestamp::now),
        ) {
            Ok(found) => found,
            Err(e) => return Ok(Err(e)),
        };
        if let Some(label) = &step.expect {
            let expected = self.version(label)?;
            if found != Some(expected) {
                bail!(
                    "expected {} to resolve to {label}, got {}",
                    step.entity,
                    self.describe(found)
                );
            }
        }
        if step.expect_missing && found.is_some() {
            bail!(
                "expected {} to resolve to nothing, got {}",
                step.entity,
                self.describe(found)
            );
        }
        Ok(Ok(found))
    }

    fn languages(
        &self,
        uow: &mut InMemoryUnitOfWork,
        step: &LanguagesStep,
    ) -> Result<Result<Option<VersionId>, VersioningError>> {
        let id = self.version(&step.version)?;
        let available = match self.apply_languages(uow, id, step) {
            Ok(available) => available,
            Err(e) => return Ok(Err(e)),
        };
        if let Some(expected) = &step.expect_available {
            if &available != expected {
                let got: Vec<&str> = available.iter().map(LanguageId::as_str).collect();
                bail!("expected available languages {expected:?}, got {got:?}");
            }
        }
        Ok(Ok(Some(id)))
    }

    fn apply_languages(
        &self,
        uow: &mut InMemoryUnitOfWork,
        id: VersionId,
        step: &LanguagesStep,
    ) -> Result<Vec<LanguageId>, VersioningError> {
        let manager = &self.manager;
        if let Some(status) = step.all {
            manager.set_all_language_statuses(uow, id, status)?;
        }
        if !step.set.is_empty() {
            manager.set_language_statuses(uow, id, &step.set)?;
        }
        for (language, at) in &step.schedule_publish {
            manager.schedule_publish(uow, id, language, *at)?;
        }
        for (language, at) in &step.schedule_archive {
            manager.schedule_archive(uow, id, language, *at)?;
        }
        for (language, at) in &step.failed_publish {
            manager.record_failed_publish(uow, id, language, *at)?;
        }
        if let Some(now) = step.run_due {
            manager.run_due_schedules(uow, id, now)?;
        }
        manager.available_languages(uow, id)
    }

    fn new_version(&self, step: &CreateStep) -> Result<Version> {
        let draft = self.manager.registry().id_for(PublishingStatus::Draft);
        let validity = ValidityWindow::new(step.valid_from, step.valid_to)
            .with_context(|| format!("invalid validity window for {}", step.entity))?;
        let mut version = Version::new(draft, step.content.clone())
            .with_languages(&step.languages, draft)
            .with_validity(validity);
        version.root_id = self.entities.get(&step.entity).copied();
        Ok(version)
    }

    fn entity(&self, label: &str) -> Result<RootId> {
        self.entities
            .get(label)
            .copied()
            .with_context(|| format!("unknown entity label '{label}'"))
    }

    fn version(&self, label: &str) -> Result<VersionId> {
        self.versions
            .get(label)
            .copied()
            .with_context(|| format!("unknown version label '{label}'"))
    }

    fn label_of(&self, id: VersionId) -> Option<&str> {
        self.versions
            .iter()
            .find(|(_, v)| **v == id)
            .map(|(label, _)| label.as_str())
    }

    fn describe(&self, id: Option<VersionId>) -> String {
        match id {
            None => "nothing".to_string(),
            Some(id) => self
                .label_of(id)
                .map_or_else(|| id.to_string(), str::to_string),
        }
    }

    /// Listed versions of every entity, by entity label.
    pub fn report(&self) -> Result<BTreeMap<String, Vec<ReportedVersion>>> {
        let mut uow = self.store.begin();
        let mut report = BTreeMap::new();
        for (entity, root) in &self.entities {
            let listed = self.manager.list_versions(&mut uow, *root)?;
            let rows = listed
                .as_slice()
                .iter()
                .map(|s| ReportedVersion {
                    label: self.label_of(s.version_id).map(str::to_string),
                    version_id: s.version_id,
                    status: s.status,
                    major: s.major,
                    minor: s.minor,
                })
                .collect();
            report.insert(entity.clone(), rows);
        }
        Ok(report)
    }
}

impl Action {
    fn name(&self) -> &'static str {
        match self {
            Self::Create(_) => "create",
            Self::Edit(_) => "edit",
            Self::Publish(_) => "publish",
            Self::Force(_) => "force",
            Self::Abandon(_) => "abandon",
            Self::Resolve(_) => "resolve",
            Self::Languages(_) => "languages",
        }
    }
}

/// Execute the replay subcommand.
pub fn run_replay(args: &ReplayArgs, config: Option<&Path>) -> Result<u8> {
    let engine_config = load_config(config)?;
    let manager =
        VersioningManager::from_config(&engine_config).context("invalid engine configuration")?;
    let scenario = Scenario::load(&args.scenario)?;
    tracing::info!(steps = scenario.steps.len(), "replaying scenario");

    let mut replay = Replay::new(manager);
    replay.run(&scenario)?;

    let report = replay.report()?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for (entity, rows) in &report {
            println!("{entity}:");
            for row in rows {
                println!(
                    "  ({},{}) {:<13} {}",
                    row.major,
                    row.minor,
                    row.status.name(),
                    row.label.as_deref().unwrap_or("-")
                );
            }
        }
    }

    if let Some(path) = &args.snapshot {
        Snapshot {
            config: engine_config,
            roots: replay.store().snapshot(),
        }
        .write(path)?;
        tracing::info!(path = %path.display(), "snapshot written");
    }
    Ok(0)
}
