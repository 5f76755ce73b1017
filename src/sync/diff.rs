//! Remote diff and bulk-replace decisions
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use log::info;

use super::canonical::{build_payload, CommandPayload};
use crate::core::SyncError;
use crate::definitions::CommandDefinition;
use crate::i18n::Translator;

/// A deployment partition: the global audience or one guild.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CommandScope {
    Global,
    Guild(String),
}

impl fmt::Display for CommandScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Global => f.write_str("global"),
            Self::Guild(id) => write!(f, "guild {id}"),
        }
    }
}

/// Narrow interface to the remote command deployment API.
///
/// Both operations must be idempotent and safe with an empty list: an
/// empty replace is how a previously-populated scope is cleared.
#[async_trait]
pub trait CommandsGateway: Send + Sync {
    async fn fetch_commands(&self, scope: &CommandScope)
        -> Result<Vec<CommandPayload>, SyncError>;

    async fn replace_commands(
        &self,
        scope: &CommandScope,
        commands: &[CommandPayload],
    ) -> Result<(), SyncError>;
}

/// What a sync pass did, for logging and tests.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub declared: usize,
    pub global_replaced: bool,
    pub guilds_replaced: Vec<String>,
    pub guilds_checked: usize,
}

/// Reconcile declared commands against the remote system.
///
/// Commands without explicit guilds deploy globally; the rest partition
/// per guild. The iteration set is the union of `known_guilds` and every
/// guild named by a command, so a guild that previously had commands but
/// now declares none still receives an empty replace (sync, not append).
/// A replace is issued only when the canonical payload sets differ, which
/// keeps unchanged deployments write-free while guaranteeing convergence.
///
/// Any fetch or replace failure aborts the pass with an error: startup
/// must not proceed believing commands are deployed when they are not.
pub async fn sync_commands(
    gateway: &dyn CommandsGateway,
    definitions: &[Arc<CommandDefinition>],
    translator: &Translator,
    known_guilds: &[String],
) -> Result<SyncReport, SyncError> {
    let mut global: Vec<CommandPayload> = Vec::new();
    let mut per_guild: BTreeMap<String, Vec<CommandPayload>> = BTreeMap::new();
    let mut scopes: BTreeSet<String> = known_guilds.iter().cloned().collect();

    for definition in definitions {
        let payload = build_payload(definition, translator);
        if definition.guilds.is_empty() {
            global.push(payload);
        } else {
            for guild in definition.guilds.iter().collect::<BTreeSet<_>>() {
                scopes.insert(guild.clone());
                per_guild
                    .entry(guild.clone())
                    .or_default()
                    .push(payload.clone());
            }
        }
    }

    let mut report = SyncReport {
        declared: definitions.len(),
        ..Default::default()
    };

    let remote_global = gateway.fetch_commands(&CommandScope::Global).await?;
    if !sets_equal(&global, &remote_global) {
        info!("Refreshing {} global (/) commands...", global.len());
        gateway
            .replace_commands(&CommandScope::Global, &global)
            .await?;
        report.global_replaced = true;
    }

    for guild in scopes {
        let declared = per_guild.remove(&guild).unwrap_or_default();
        let scope = CommandScope::Guild(guild.clone());
        let remote = gateway.fetch_commands(&scope).await?;

        let changed = declared.len() != remote.len()
            || declared.iter().any(|candidate| {
                !remote
                    .iter()
                    .any(|existing| existing.canonical() == candidate.canonical())
            });

        if changed {
            info!("Syncing {} commands for {scope}...", declared.len());
            gateway.replace_commands(&scope, &declared).await?;
            report.guilds_replaced.push(guild);
        }
        report.guilds_checked += 1;
    }

    info!("Loaded {} (/) slash commands.", report.declared);
    Ok(report)
}

/// Order-independent structural equality of two command sets.
///
/// Commands pair up by (name, kind); each pair must be canonically equal.
fn sets_equal(declared: &[CommandPayload], remote: &[CommandPayload]) -> bool {
    if declared.len() != remote.len() {
        return false;
    }

    let mut remote_by_key: HashMap<(&str, u8), &CommandPayload> = remote
        .iter()
        .map(|command| ((command.name.as_str(), command.kind), command))
        .collect();

    declared.iter().all(|candidate| {
        remote_by_key
            .remove(&(candidate.name.as_str(), candidate.kind))
            .map(|existing| existing.canonical() == candidate.canonical())
            .unwrap_or(false)
    })
}
