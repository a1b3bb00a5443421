//! Secret service: create/get/update/delete/list over a [`SecretStore`].
//!
//! Reads take a fresh snapshot of the addressed folder, select a record
//! through the [`OverlayResolver`], and expand references with the
//! [`Interpolator`]. Store failures pass through as
//! [`SecretError::Transport`]; a cancellation token, when set, is raced
//! against every store call.

use std::future::Future;
use std::sync::Arc;

use stratum_core::config::{ListErrorPolicy, ListView, SecretsConfig};
use stratum_core::{EnvironmentWriter, ProcessEnvironment};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{Result, SecretError};
use crate::interpolate::{references, Interpolator};
use crate::overlay::{OverlayResolver, Precedence};
use crate::store::{SecretStore, StoreResult};
use crate::types::{
    validate_name, ListOptions, ResolvedSecret, SecretOptions, SecretRecord, SecretScope,
};

/// Orchestrates overlay lookup and interpolation on top of a store.
pub struct SecretService {
    store: Arc<dyn SecretStore>,
    env_writer: Arc<dyn EnvironmentWriter>,
    settings: SecretsConfig,
    cancel: Option<CancellationToken>,
}

impl SecretService {
    /// Create a service with the given defaults. Mirroring goes to the real
    /// process environment unless another writer is supplied.
    pub fn new(store: Arc<dyn SecretStore>, settings: SecretsConfig) -> Self {
        Self {
            store,
            env_writer: Arc::new(ProcessEnvironment),
            settings,
            cancel: None,
        }
    }

    /// Replace the host-environment writer used by listing.
    pub fn with_environment_writer(mut self, writer: Arc<dyn EnvironmentWriter>) -> Self {
        self.env_writer = writer;
        self
    }

    /// Abort in-flight store calls when `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn settings(&self) -> &SecretsConfig {
        &self.settings
    }

    /// Create or overwrite a secret. An unset type creates a shared secret.
    ///
    /// Returns the literal value as stored, without expansion.
    pub async fn create(
        &self,
        name: &str,
        value: &str,
        options: &SecretOptions,
    ) -> Result<ResolvedSecret> {
        validate_name(name)?;
        let (environment, path) = options.folder(&self.settings)?;
        let scope = SecretScope::new(environment, path, options.secret_type.unwrap_or_default())?;
        let record = SecretRecord::new(name, value, scope);

        let existed = self.guarded(self.store.fetch(&record.key())).await?.is_some();
        let stored = self.guarded(self.store.upsert(record)).await?;

        info!(
            name,
            environment = %stored.scope.environment,
            path = %stored.scope.path,
            secret_type = %stored.scope.secret_type,
            references = references(&stored.raw_value).count(),
            "{}",
            if existed { "secret overwritten" } else { "secret created" }
        );
        Ok(ResolvedSecret::from_record(&stored, stored.raw_value.as_str()))
    }

    /// Read a secret with all references expanded.
    pub async fn get(&self, name: &str, options: &SecretOptions) -> Result<ResolvedSecret> {
        validate_name(name)?;
        let overlay = self.snapshot(options).await?;
        let record = overlay.resolve_single(name, Precedence::for_read(options.secret_type))?;
        let value = self.interpolator(&overlay).resolve(record)?;

        debug!(name, secret_type = %record.scope.secret_type, "secret read");
        Ok(ResolvedSecret::from_record(record, value))
    }

    /// Replace the value of an existing secret.
    ///
    /// With no type given, the record a `get` would select is updated; an
    /// explicit type updates exactly that record.
    pub async fn update(
        &self,
        name: &str,
        value: &str,
        options: &SecretOptions,
    ) -> Result<ResolvedSecret> {
        validate_name(name)?;
        let overlay = self.snapshot(options).await?;
        let target = overlay.resolve_single(name, Precedence::for_write(options.secret_type))?;

        let updated = SecretRecord::new(name, value, target.scope.clone());
        let stored = self.guarded(self.store.upsert(updated)).await?;

        info!(
            name,
            environment = %stored.scope.environment,
            path = %stored.scope.path,
            secret_type = %stored.scope.secret_type,
            "secret updated"
        );
        Ok(ResolvedSecret::from_record(&stored, stored.raw_value.as_str()))
    }

    /// Delete a secret, returning its value as it resolved before removal.
    ///
    /// Selection follows [`SecretService::update`]. If the record's
    /// references do not resolve, the resolution error is returned and the
    /// record is kept; use [`SecretService::purge`] to remove it anyway.
    pub async fn delete(&self, name: &str, options: &SecretOptions) -> Result<ResolvedSecret> {
        validate_name(name)?;
        let overlay = self.snapshot(options).await?;
        let target = overlay.resolve_single(name, Precedence::for_write(options.secret_type))?;
        let value = self.interpolator(&overlay).resolve(target)?;

        let removed = self.remove(&overlay, target).await?;
        Ok(ResolvedSecret::from_record(&removed, value))
    }

    /// Delete a secret without expanding it, returning the stored record.
    ///
    /// Selection follows [`SecretService::delete`]. This is the way to remove
    /// a record whose references are broken (a cycle, a missing target).
    pub async fn purge(&self, name: &str, options: &SecretOptions) -> Result<SecretRecord> {
        validate_name(name)?;
        let overlay = self.snapshot(options).await?;
        let target = overlay.resolve_single(name, Precedence::for_write(options.secret_type))?;
        self.remove(&overlay, target).await
    }

    /// List a folder.
    ///
    /// Each record is expanded independently when
    /// `include_resolved_references` is set, so a chain `A -> B -> C` yields
    /// the same final value at all three. Mirroring to the host environment
    /// happens only after the whole listing succeeded, in listing order, so
    /// in the dual view a personal value overwrites the shared one.
    pub async fn list_all(&self, options: &ListOptions) -> Result<Vec<ResolvedSecret>> {
        let overlay = self.snapshot(&options.as_secret_options()).await?;
        let view = options.view.unwrap_or(self.settings.list_view);
        let policy = options.errors.unwrap_or(self.settings.list_errors);

        // A type filter already leaves one record per name; dedup must not
        // run first or shadowed shared records would vanish.
        let records: Vec<&SecretRecord> = match (options.secret_type, view) {
            (Some(wanted), _) => overlay
                .resolve_all()
                .into_iter()
                .filter(|record| record.secret_type() == wanted)
                .collect(),
            (None, ListView::Dual) => overlay.resolve_all(),
            (None, ListView::Effective) => overlay.resolve_effective(),
        };

        let interpolator = self.interpolator(&overlay);
        let mut secrets = Vec::with_capacity(records.len());

        for record in records {
            if !options.include_resolved_references {
                secrets.push(ResolvedSecret::from_record(record, record.raw_value.as_str()));
                continue;
            }

            match interpolator.resolve(record) {
                Ok(value) => secrets.push(ResolvedSecret::from_record(record, value)),
                Err(e) if policy == ListErrorPolicy::Skip && e.is_resolution_error() => {
                    warn!(name = %record.name, "skipping secret in listing: {e}");
                }
                Err(e) => return Err(e),
            }
        }

        if options.mirror_to_host_environment {
            self.mirror(&secrets, policy)?;
        }

        debug!(
            environment = %overlay.environment(),
            path = %overlay.path(),
            count = secrets.len(),
            "secrets listed"
        );
        Ok(secrets)
    }

    /// Publish a listing through the environment writer.
    ///
    /// Every pair is vetted before the first write, so a refusal under
    /// `FailFast` leaves the host environment untouched. Under `Skip` refused
    /// names are logged and left out.
    fn mirror(&self, secrets: &[ResolvedSecret], policy: ListErrorPolicy) -> Result<()> {
        let mut accepted = Vec::with_capacity(secrets.len());
        for secret in secrets {
            match self.env_writer.check(&secret.name, secret.expose()) {
                Ok(()) => accepted.push(secret),
                Err(e) if policy == ListErrorPolicy::Skip => {
                    warn!(name = %secret.name, "not mirroring secret: {e}");
                }
                Err(e) => return Err(e.into()),
            }
        }

        for secret in &accepted {
            self.env_writer.set(&secret.name, secret.expose())?;
        }
        debug!(count = accepted.len(), "mirrored secrets to host environment");
        Ok(())
    }

    /// Remove `target` from the store, reporting a concurrent removal as
    /// `NotFound`.
    async fn remove(&self, overlay: &OverlayResolver, target: &SecretRecord) -> Result<SecretRecord> {
        let Some(removed) = self.guarded(self.store.remove(&target.key())).await? else {
            // Raced with another delete between snapshot and removal.
            return Err(SecretError::NotFound {
                name: target.name.clone(),
                environment: overlay.environment().to_string(),
                path: overlay.path().to_string(),
            });
        };

        info!(
            name = %removed.name,
            environment = %removed.scope.environment,
            path = %removed.scope.path,
            secret_type = %removed.scope.secret_type,
            "secret deleted"
        );
        Ok(removed)
    }

    /// Fetch the addressed folder and build an overlay over it.
    async fn snapshot(&self, options: &SecretOptions) -> Result<OverlayResolver> {
        let (environment, path) = options.folder(&self.settings)?;
        let records = self.guarded(self.store.list(&environment, &path)).await?;
        Ok(OverlayResolver::new(environment, path, records))
    }

    fn interpolator<'a>(&self, overlay: &'a OverlayResolver) -> Interpolator<'a> {
        Interpolator::new(overlay, self.settings.max_depth)
    }

    /// Await a store call, mapping its failure to `Transport` and racing it
    /// against the cancellation token.
    async fn guarded<T>(&self, call: impl Future<Output = StoreResult<T>>) -> Result<T> {
        match &self.cancel {
            Some(token) => tokio::select! {
                biased;
                _ = token.cancelled() => Err(SecretError::Cancelled),
                result = call => result.map_err(SecretError::Transport),
            },
            None => call.await.map_err(SecretError::Transport),
        }
    }
}
