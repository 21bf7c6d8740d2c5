//! Subcommand execution
//!
//! Builds the updater services from parsed arguments and runs one command.
//! Returns the process exit code; only setup problems surface as errors.

use crate::app::cli::args::{Args, Command, DEFAULT_SESSION};
use crate::app::cli::display::{format_decision, format_rollback, print_info};
use crate::core::error_handling::ContextualError;
use crate::core::validation::ValidationError;
use crate::install::api::{JsonPluginHost, LocalInstaller, PluginHost};
use crate::rollback::api::{
    rollback_nonce_action, NonceVerifier, RollbackOptions, RollbackOrchestrator, RollbackRequest,
    TickNonce,
};
use crate::updater::api::{
    DescriptorError, FetchFailure, FileUpdateCache, HttpMetadataFetcher, MemoryUpdateCache,
    UpdateCache, UpdateChecker, UpdateSession, UpdaterError,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Descriptor(#[from] DescriptorError),

    #[error(transparent)]
    Client(#[from] FetchFailure),

    #[error(transparent)]
    Updater(#[from] UpdaterError),

    #[error("Could not encode output: {0}")]
    Output(#[from] serde_json::Error),
}

impl ContextualError for CommandError {
    fn is_user_actionable(&self) -> bool {
        match self {
            CommandError::Validation(_) => true,
            CommandError::Descriptor(e) => e.is_user_actionable(),
            CommandError::Updater(e) => e.is_user_actionable(),
            CommandError::Client(_) | CommandError::Output(_) => false,
        }
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            CommandError::Validation(e) => e.user_message(),
            CommandError::Descriptor(e) => e.user_message(),
            CommandError::Updater(e) => e.user_message(),
            CommandError::Client(_) | CommandError::Output(_) => None,
        }
    }
}

pub type CommandResult<T> = Result<T, CommandError>;

/// Everything one invocation needs, wired from the arguments
pub struct Services {
    pub checker: Arc<UpdateChecker>,
    pub nonces: Arc<TickNonce>,
    pub host: Arc<dyn PluginHost>,
    pub plugins_dir: PathBuf,
}

impl Services {
    pub fn from_args(args: &Args) -> CommandResult<Self> {
        let plugins_dir = args.plugins_dir()?;
        let session = UpdateSession::open(args.plugin_file()?, &plugins_dir, args.credentials())?;

        let cache: Arc<dyn UpdateCache> = if args.no_cache {
            Arc::new(MemoryUpdateCache::new())
        } else {
            let dir = args.cache_dir();
            log::debug!("Caching update decisions in {:?}", dir);
            Arc::new(FileUpdateCache::new(dir))
        };
        let fetcher = HttpMetadataFetcher::new(args.timeout_duration())?;
        let checker = UpdateChecker::new(Arc::new(session), Arc::new(fetcher), cache)
            .with_ttl(args.cache_ttl_secs())
            .with_redirect(args.redirect_to());

        let nonces = TickNonce::new(args.nonce_secret()?, args.nonce_lifetime_secs());
        let host = JsonPluginHost::new(&args.site_dir()?, plugins_dir.clone());

        Ok(Self {
            checker: Arc::new(checker),
            nonces: Arc::new(nonces),
            host: Arc::new(host),
            plugins_dir,
        })
    }
}

/// Run the selected command; `Ok` carries the exit code
pub async fn run(args: &Args) -> CommandResult<i32> {
    let services = Services::from_args(args)?;
    let use_color = args.use_color();

    match args.selected_command() {
        Command::Check { force, json } => {
            let decision = if force {
                services.checker.check_now().await
            } else {
                services.checker.check().await
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&decision)?);
            } else {
                print!("{}", format_decision(&decision, use_color));
            }
            Ok(0)
        }
        Command::Info { json } => {
            let info = services.checker.plugin_info().await;
            if json {
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                print_info(&info, use_color);
            }
            Ok(0)
        }
        Command::Rollback {
            target_version,
            nonce,
            session,
            json,
        } => {
            let session = session.unwrap_or_else(|| DEFAULT_SESSION.to_string());
            let descriptor = services.checker.session().descriptor().clone();
            let nonce = nonce.unwrap_or_else(|| {
                log::debug!("Issuing a rollback token for session '{}'", session);
                services
                    .nonces
                    .create(&rollback_nonce_action(&descriptor.basename), &session)
            });
            let request = RollbackRequest {
                plugin_id: descriptor.basename.clone(),
                target_version,
                nonce,
                actor_capability_ok: args.can_manage_updates(),
                session_token: session,
            };

            let mut options = RollbackOptions::new(services.plugins_dir.clone());
            options.verbose = args.debug_trace;
            options.same_origin_packages = args.same_origin_packages;
            let nonces: Arc<dyn NonceVerifier> = services.nonces.clone();
            let orchestrator = RollbackOrchestrator::new(
                services.checker.clone(),
                nonces,
                services.host.clone(),
                options,
            );

            let mut installer = match &args.package_mirror {
                Some(mirror) => LocalInstaller::with_mirror(mirror.clone()),
                None => LocalInstaller::new(),
            };
            let result = orchestrator.run(&request, &mut installer).await;
            if json {
                println!("{}", serde_json::to_string_pretty(&result.to_json())?);
            } else {
                print!("{}", format_rollback(&result, use_color));
            }
            Ok(if result.success { 0 } else { 1 })
        }
        Command::Recheck => {
            let redirect = services.checker.force_recheck(args.can_manage_updates())?;
            println!("Cached update state cleared. Continue at {}", redirect);
            Ok(0)
        }
        Command::Nonce { session } => {
            let session = session.unwrap_or_else(|| DEFAULT_SESSION.to_string());
            let basename = &services.checker.session().descriptor().basename;
            println!(
                "{}",
                services
                    .nonces
                    .create(&rollback_nonce_action(basename), &session)
            );
            Ok(0)
        }
    }
}
