//! Rollback orchestrator
//!
//! Single pass through `Validate -> ResolvePackage -> Install -> Reactivate
//! -> Done`; any step may end in `Failed`. `Reactivate` is only entered when
//! the plugin was active before the install. Nothing is retried and every
//! upstream failure is mapped onto a [`RollbackErrorCode`].

use crate::core::validation::validate_target_version;
use crate::install::api::{InstallPipeline, PackageInstaller, PluginHost, Reactivation};
use crate::rollback::nonce::{rollback_nonce_action, NonceVerifier};
use crate::rollback::request::{RollbackErrorCode, RollbackRequest, RollbackResult};
use crate::updater::api::{build_info, endpoint_url, FetchAction, PluginDescriptor, UpdateChecker};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "snake_case")]
pub enum RollbackState {
    Idle,
    Validate,
    ResolvePackage,
    Install,
    Reactivate,
    Done,
    Failed,
}

#[derive(Debug, Clone)]
pub struct RollbackOptions {
    /// Attach the state trail and installer feedback to the result
    pub verbose: bool,
    /// Only install packages served from the update server's own host
    pub same_origin_packages: bool,
    pub plugins_dir: PathBuf,
}

impl RollbackOptions {
    pub fn new(plugins_dir: impl Into<PathBuf>) -> Self {
        Self {
            verbose: false,
            same_origin_packages: false,
            plugins_dir: plugins_dir.into(),
        }
    }
}

struct Failure {
    code: RollbackErrorCode,
    message: String,
}

impl Failure {
    fn new(code: RollbackErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// State trail of one run
struct Trail {
    state: RollbackState,
    lines: Vec<String>,
}

impl Trail {
    fn enter(&mut self, next: RollbackState) {
        log::debug!("Rollback state {} -> {}", self.state, next);
        self.lines.push(format!("{} -> {}", self.state, next));
        self.state = next;
    }

    fn note(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }
}

pub struct RollbackOrchestrator {
    checker: Arc<UpdateChecker>,
    nonces: Arc<dyn NonceVerifier>,
    host: Arc<dyn PluginHost>,
    options: RollbackOptions,
}

impl RollbackOrchestrator {
    pub fn new(
        checker: Arc<UpdateChecker>,
        nonces: Arc<dyn NonceVerifier>,
        host: Arc<dyn PluginHost>,
        options: RollbackOptions,
    ) -> Self {
        Self {
            checker,
            nonces,
            host,
            options,
        }
    }

    pub async fn run(
        &self,
        request: &RollbackRequest,
        installer: &mut dyn PackageInstaller,
    ) -> RollbackResult {
        let descriptor = self.checker.session().descriptor();
        let mut trail = Trail {
            state: RollbackState::Idle,
            lines: Vec::new(),
        };

        let outcome = self.drive(request, descriptor, installer, &mut trail).await;
        let mut result = match outcome {
            Ok(result) => result,
            Err(failure) => {
                trail.enter(RollbackState::Failed);
                log::warn!(
                    "Rollback of '{}' to '{}' failed ({}): {}",
                    descriptor.slug,
                    request.target_version.trim(),
                    failure.code,
                    failure.message
                );
                RollbackResult::failed(
                    failure.code,
                    failure.message,
                    &descriptor.version,
                    request.target_version.trim(),
                )
            }
        };

        if self.options.verbose {
            result.debug_trace = Some(trail.lines);
        }
        result
    }

    async fn drive(
        &self,
        request: &RollbackRequest,
        descriptor: &PluginDescriptor,
        installer: &mut dyn PackageInstaller,
        trail: &mut Trail,
    ) -> Result<RollbackResult, Failure> {
        trail.enter(RollbackState::Validate);
        let target = self.validate(request, descriptor)?;

        trail.enter(RollbackState::ResolvePackage);
        let package_url = self.resolve_package(descriptor, &target).await?;
        trail.note(format!("package {}", package_url));

        trail.enter(RollbackState::Install);
        let pipeline = InstallPipeline::new(self.host.as_ref(), &self.options.plugins_dir);
        let installed = pipeline.install(descriptor, &package_url, installer);
        for line in installer.feedback() {
            trail.note(line);
        }
        let outcome = installed.map_err(|e| {
            Failure::new(
                RollbackErrorCode::InstallFailure,
                format!("Installing version {} failed: {}", target, e),
            )
        })?;

        if outcome.was_active {
            trail.enter(RollbackState::Reactivate);
        }
        let (error_code, message) = match outcome.reactivation {
            Reactivation::NotNeeded => (
                None,
                format!("{} was rolled back to version {}.", descriptor.name, target),
            ),
            Reactivation::Reactivated => (
                None,
                format!(
                    "{} was rolled back to version {} and reactivated.",
                    descriptor.name, target
                ),
            ),
            Reactivation::Failed(cause) => {
                log::warn!(
                    "'{}' rolled back to {} but reactivation failed: {}",
                    descriptor.slug,
                    target,
                    cause
                );
                (
                    Some(RollbackErrorCode::ReactivationFailure),
                    format!(
                        "{} was rolled back to version {}, but it could not be reactivated: {}",
                        descriptor.name, target, cause
                    ),
                )
            }
        };

        trail.enter(RollbackState::Done);
        if let Err(e) = self.checker.invalidate() {
            log::warn!("Could not clear cached update state: {}", e);
        }
        log::info!(
            "Rolled back '{}' from {} to {}",
            descriptor.slug,
            descriptor.version,
            target
        );

        Ok(RollbackResult {
            success: true,
            current_version: descriptor.version.clone(),
            target_version: target,
            error_code,
            message,
            debug_trace: None,
        })
    }

    fn validate(
        &self,
        request: &RollbackRequest,
        descriptor: &PluginDescriptor,
    ) -> Result<String, Failure> {
        let invalid = |message: &str| Failure::new(RollbackErrorCode::ValidationFailure, message);

        if !request.actor_capability_ok {
            return Err(invalid("You do not have permission to roll back plugins."));
        }
        let plugin_id = request.plugin_id.trim();
        if plugin_id != descriptor.basename && plugin_id != descriptor.slug {
            return Err(invalid("The requested plugin is not managed by this updater."));
        }
        let action = rollback_nonce_action(&descriptor.basename);
        if !self
            .nonces
            .verify(request.nonce.trim(), &action, &request.session_token)
        {
            return Err(invalid("The security token is missing or has expired."));
        }
        validate_target_version(&request.target_version).map_err(|e| invalid(e.message()))
    }

    async fn resolve_package(
        &self,
        descriptor: &PluginDescriptor,
        target: &str,
    ) -> Result<String, Failure> {
        let record = self
            .checker
            .fetch_record(FetchAction::PluginInformation)
            .await
            .map_err(|e| {
                Failure::new(
                    RollbackErrorCode::NoTargetVersion,
                    format!("Version information is unavailable: {}", e),
                )
            })?;

        let info = build_info(&record, descriptor);
        let package_url = info.versions.get(target).cloned().ok_or_else(|| {
            Failure::new(
                RollbackErrorCode::NoTargetVersion,
                format!("Version {} is not available for rollback.", target),
            )
        })?;

        if self.options.same_origin_packages {
            self.check_origin(descriptor, target, &package_url)?;
        }
        Ok(package_url)
    }

    fn check_origin(
        &self,
        descriptor: &PluginDescriptor,
        target: &str,
        package_url: &str,
    ) -> Result<(), Failure> {
        let update_host = descriptor
            .update_uri
            .as_deref()
            .and_then(|uri| endpoint_url(uri).ok())
            .and_then(|url| url.host_str().map(str::to_ascii_lowercase));
        let package_host = reqwest::Url::parse(package_url)
            .ok()
            .and_then(|url| url.host_str().map(str::to_ascii_lowercase));

        match (update_host, package_host) {
            (Some(update), Some(package)) if update == package => Ok(()),
            _ => Err(Failure::new(
                RollbackErrorCode::NoTargetVersion,
                format!(
                    "The package for version {} is not served by the update server.",
                    target
                ),
            )),
        }
    }
}
