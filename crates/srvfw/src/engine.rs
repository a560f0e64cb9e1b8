// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The server lifecycle engine.
//!
//! Drives a process from entry to exit: forward through the stage
//! sequence, a blocking wait while Ready, then the reverse cleanup walk.
//! All shutdown paths (remote admin stop, signals, derived code, stage
//! failure) funnel through [`ShutdownHandle::shutdown`].

use std::sync::atomic::{AtomicU16, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use cqc_core::{ExitCode, ServerDescriptor, Stage, StageOutcome};
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::admin::{self, CORE_ADMIN_OBJECT};
use crate::env::EnvInfo;
use crate::events::{EventControl, EventDirs, NullEventControl};
use crate::hooks::{AdminInfo, RetryInfo, ServerApp, StageError};
use crate::listener::{AdminListener, MAX_CLIENTS_CEILING};
use crate::logging::{LogCtl, NullLogCtl};
use crate::login::{
    self, NullSecretStore, NullSecurityClient, SecretStore, SecurityClient, SessionCtx,
};
use crate::nameservice::{NameService, NullNameService, CLEANUP_DEADLINE};
use crate::params;
use crate::rebinder::{Binding, Rebinder, REBIND_INTERVAL};
use crate::registry::ObjectRegistry;
use crate::signal::{self, SignalGuard};
use crate::term_event::TerminationEvent;

/// Shortest allowed retry sleep.
pub const RETRY_MIN: Duration = Duration::from_secs(1);
/// Longest allowed retry sleep, also the default when a stage asked for
/// a retry without a wait.
pub const RETRY_MAX: Duration = Duration::from_secs(15);

/// Clamp a stage-supplied retry wait into the allowed range.
pub fn clamp_retry(wait: Duration) -> Duration {
    if wait.is_zero() {
        RETRY_MAX
    } else {
        wait.clamp(RETRY_MIN, RETRY_MAX)
    }
}

struct HandleInner {
    exit_code: Mutex<Option<ExitCode>>,
    stage: AtomicU8,
    admin_port: AtomicU16,
    cancel: CancellationToken,
    event: Mutex<Option<Arc<TerminationEvent>>>,
}

/// The single shutdown primitive, safe from any task or thread.
///
/// Cloned into the admin endpoint, the signal watcher and derived
/// worker code; the engine keeps the original.
#[derive(Clone)]
pub struct ShutdownHandle {
    inner: Arc<HandleInner>,
}

impl Default for ShutdownHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownHandle {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(HandleInner {
                exit_code: Mutex::new(None),
                stage: AtomicU8::new(Stage::Start.index()),
                admin_port: AtomicU16::new(0),
                cancel: CancellationToken::new(),
                event: Mutex::new(None),
            }),
        }
    }

    /// Request an orderly shutdown.
    ///
    /// Stores the exit code, wakes the control task if it is still
    /// starting up, and signals the termination event. Reentrant; a
    /// later caller's exit code wins.
    pub fn shutdown(&self, code: ExitCode) {
        *self.inner.exit_code.lock() = Some(code);
        if self.stage() < Stage::Ready {
            self.inner.cancel.cancel();
        }
        let event = self.inner.event.lock().clone();
        if let Some(event) = event {
            event.signal();
        }
    }

    pub fn exit_code(&self) -> Option<ExitCode> {
        *self.inner.exit_code.lock()
    }

    /// Current stage cursor. Written only by the control task.
    pub fn stage(&self) -> Stage {
        Stage::from_index(self.inner.stage.load(Ordering::SeqCst)).unwrap_or(Stage::Start)
    }

    /// The termination event, once the CreateEvent stage has run.
    pub fn event(&self) -> Option<Arc<TerminationEvent>> {
        self.inner.event.lock().clone()
    }

    /// The bound admin port, once the InitServerTransport stage has run.
    pub fn admin_port(&self) -> Option<u16> {
        match self.inner.admin_port.load(Ordering::SeqCst) {
            0 => None,
            port => Some(port),
        }
    }

    /// Cancellation token derived worker tasks may watch.
    pub fn cancel_token(&self) -> CancellationToken {
        self.inner.cancel.clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancel.is_cancelled()
    }

    pub(crate) async fn cancelled(&self) {
        self.inner.cancel.cancelled().await
    }

    pub(crate) fn set_stage(&self, stage: Stage) {
        self.inner.stage.store(stage.index(), Ordering::SeqCst);
    }

    pub(crate) fn set_admin_port(&self, port: u16) {
        self.inner.admin_port.store(port, Ordering::SeqCst);
    }

    pub(crate) fn set_event(&self, event: Arc<TerminationEvent>) {
        *self.inner.event.lock() = Some(event);
    }

    pub(crate) fn clear_event(&self) -> Option<Arc<TerminationEvent>> {
        self.inner.event.lock().take()
    }
}

/// Collaborators injected into the engine.
pub struct ServerDeps {
    pub logger: Arc<dyn LogCtl>,
    pub ns: Arc<dyn NameService>,
    pub security: Arc<dyn SecurityClient>,
    pub secrets: Arc<dyn SecretStore>,
    pub events: Arc<dyn EventControl>,
    pub session: Arc<SessionCtx>,
}

impl ServerDeps {
    /// Deps for a server running without platform peers: local logging,
    /// no name service, no security service, no event system.
    pub fn standalone() -> Self {
        Self {
            logger: Arc::new(NullLogCtl),
            ns: Arc::new(NullNameService),
            security: Arc::new(NullSecurityClient),
            secrets: Arc::new(NullSecretStore),
            events: Arc::new(NullEventControl),
            session: Arc::new(SessionCtx::new()),
        }
    }

    pub fn with_logger(mut self, logger: Arc<dyn LogCtl>) -> Self {
        self.logger = logger;
        self
    }

    pub fn with_ns(mut self, ns: Arc<dyn NameService>) -> Self {
        self.ns = ns;
        self
    }

    pub fn with_security(mut self, security: Arc<dyn SecurityClient>) -> Self {
        self.security = security;
        self
    }

    pub fn with_events(mut self, events: Arc<dyn EventControl>) -> Self {
        self.events = events;
        self
    }
}

/// The lifecycle engine. Owns the derived app and every framework
/// resource created during startup.
pub struct ServerCore<A: ServerApp> {
    descriptor: ServerDescriptor,
    app: A,
    deps: ServerDeps,
    handle: ShutdownHandle,
    registry: Arc<ObjectRegistry>,
    args: Vec<String>,
    env_info: Option<EnvInfo>,
    listen_port: u16,
    max_clients: u32,
    listener: Option<AdminListener>,
    signal_guard: Option<SignalGuard>,
    rebinder: Option<Rebinder>,
    admin_info: Option<AdminInfo>,
    admin_binding: Option<String>,
}

impl<A: ServerApp> ServerCore<A> {
    pub fn new(descriptor: ServerDescriptor, app: A, deps: ServerDeps) -> Self {
        let listen_port = descriptor.default_port;
        Self {
            descriptor,
            app,
            deps,
            handle: ShutdownHandle::new(),
            registry: Arc::new(ObjectRegistry::new()),
            args: std::env::args().skip(1).collect(),
            env_info: None,
            listen_port,
            max_clients: 0,
            listener: None,
            signal_guard: None,
            rebinder: None,
            admin_info: None,
            admin_binding: None,
        }
    }

    /// Replace the process arguments (tests and embedding).
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.handle.clone()
    }

    pub fn registry(&self) -> Arc<ObjectRegistry> {
        Arc::clone(&self.registry)
    }

    /// The admin listen port. After InitServerTransport this is the
    /// actually bound port.
    pub fn listen_port(&self) -> u16 {
        self.listen_port
    }

    /// Drive the whole lifecycle: init, wait, cleanup. Returns the exit
    /// code the process should end with.
    pub async fn run(mut self) -> ExitCode {
        info!(server = %self.descriptor.name, "starting: {}", self.descriptor.descr);

        self.do_init().await;

        let reached_ready = self.handle.stage() == Stage::Ready;
        if reached_ready {
            if let Some(event) = self.handle.event() {
                self.app.wait_for_term(&event).await;
            }
        }

        self.do_cleanup().await;

        let code = match self.handle.exit_code() {
            Some(code) => code,
            None if reached_ready => ExitCode::Normal,
            None => ExitCode::InitFailed,
        };
        info!(server = %self.descriptor.name, ?code, "exiting");
        code
    }

    /// Walk the cursor forward until Ready, a failure, or cancellation.
    async fn do_init(&mut self) {
        let mut retry_count = 0u32;
        loop {
            let stage = self.handle.stage();
            if stage >= Stage::Ready {
                break;
            }

            let outcome = match self.run_stage(stage, RetryInfo { count: retry_count }).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!(stage = %stage, "init failed: {}", e);
                    self.handle.shutdown(ExitCode::FatalError);
                    break;
                }
            };

            match outcome {
                StageOutcome::Failed => {
                    error!(stage = %stage, "stage failed, abandoning startup");
                    break;
                }
                StageOutcome::Retry { wait } => {
                    let wait = clamp_retry(wait);
                    debug!(stage = %stage, retry = retry_count, ?wait, "stage asked to retry");
                    tokio::select! {
                        _ = self.handle.cancelled() => break,
                        _ = tokio::time::sleep(wait) => {}
                    }
                    retry_count += 1;
                }
                StageOutcome::Success => {
                    // A shutdown request during startup is only visible
                    // here; nothing is waiting on the event yet.
                    if self.handle.is_cancelled() {
                        break;
                    }
                    match stage.next() {
                        Some(next) => self.handle.set_stage(next),
                        None => break,
                    }
                    retry_count = 0;
                }
            }
        }

        if self.handle.stage() == Stage::Ready {
            info!("{} is ready", self.descriptor.descr);
        } else if let Some(event) = self.handle.event() {
            // Make sure nothing ends up blocked on the event after a
            // failed startup.
            event.signal();
        }
    }

    async fn run_stage(
        &mut self,
        stage: Stage,
        retry: RetryInfo,
    ) -> Result<StageOutcome, StageError> {
        match stage {
            Stage::Start | Stage::Ready => Ok(StageOutcome::Success),

            Stage::LoadEnv => {
                self.env_info = Some(EnvInfo::load().map_err(StageError::new)?);
                Ok(StageOutcome::Success)
            }

            Stage::CreateEvent => {
                let event_dir = self.env()?.event_dir.clone();
                let event = TerminationEvent::create(&event_dir, &self.descriptor.event_name)
                    .map_err(StageError::new)?;
                self.handle.set_event(Arc::new(event));
                Ok(StageOutcome::Success)
            }

            Stage::SetSigHandler => {
                self.signal_guard =
                    Some(signal::install(self.handle.clone()).map_err(StageError::new)?);
                Ok(StageOutcome::Success)
            }

            Stage::InitClientTransport => {
                // Outbound connections are made per call; nothing to
                // build up front.
                debug!("client transport ready");
                Ok(StageOutcome::Success)
            }

            Stage::InstallLogger => {
                self.deps.logger.install()?;
                info!("{} starting up", self.descriptor.descr);
                Ok(StageOutcome::Success)
            }

            Stage::ParseParams => self.parse_params().await,

            Stage::MakeDirs => {
                self.app.make_dirs().await?;
                Ok(StageOutcome::Success)
            }

            Stage::LogIn => {
                if self.descriptor.opts.login {
                    login::run_login(
                        self.deps.security.as_ref(),
                        self.deps.secrets.as_ref(),
                        &self.deps.session,
                        retry,
                    )
                    .await
                } else {
                    Ok(StageOutcome::Success)
                }
            }

            Stage::InitServerTransport => {
                let listener = AdminListener::bind(
                    self.listen_port,
                    self.max_clients,
                    Arc::clone(&self.registry),
                )
                .await
                .map_err(StageError::new)?;
                self.listen_port = listener.port();
                self.handle.set_admin_port(self.listen_port);
                self.listener = Some(listener);
                Ok(StageOutcome::Success)
            }

            Stage::LoadConfig => self.app.load_config(retry).await,
            Stage::WaitPrereqs => self.app.wait_prereqs(retry).await,

            Stage::PreRegInit => {
                self.app.pre_reg_init().await?;
                Ok(StageOutcome::Success)
            }

            Stage::RegSrvObjects => {
                self.register_objects().await?;
                Ok(StageOutcome::Success)
            }

            Stage::StartWorkers => {
                let handle = self.handle.clone();
                self.app.start_workers(&handle).await?;
                Ok(StageOutcome::Success)
            }

            Stage::PreBindInit => {
                self.app.pre_bind_init().await?;
                Ok(StageOutcome::Success)
            }

            Stage::StartRebinder => {
                self.start_rebinder();
                Ok(StageOutcome::Success)
            }

            Stage::EnableEvents => self.enable_events().await,
        }
    }

    async fn parse_params(&mut self) -> Result<StageOutcome, StageError> {
        let parsed = match params::parse(self.args.clone()) {
            Ok(parsed) => parsed,
            Err(e) => {
                error!("{}", e);
                return Ok(StageOutcome::Failed);
            }
        };

        if let Some(port) = parsed.port {
            self.listen_port = port;
        }
        if let Some(max) = parsed.max_clients {
            self.max_clients = max.min(MAX_CLIENTS_CEILING);
            if self.max_clients != max {
                info!(clipped = self.max_clients, "maximum clients clipped to transport ceiling");
            }
        }

        if parsed.others.is_empty() {
            Ok(StageOutcome::Success)
        } else {
            self.app.parse_params(&parsed.others).await
        }
    }

    async fn register_objects(&mut self) -> Result<(), StageError> {
        // Derived objects first; if the app throws, the admin endpoint
        // is never registered either.
        self.app.register_objects(&self.registry).await?;

        let raw = self.app.query_admin_info();
        self.admin_info = Some(raw.clone());
        let (admin, binding) = admin::build_admin(&self.descriptor, raw, self.handle.clone());
        self.registry.register(admin).map_err(StageError::new)?;
        self.admin_binding = Some(binding);
        Ok(())
    }

    fn start_rebinder(&mut self) {
        let mut bindings = Vec::new();
        if let (Some(path), Some(info)) = (&self.admin_binding, &self.admin_info) {
            bindings.push(Binding {
                path: path.clone(),
                descr: info.descr.clone(),
                extras: info.extras.clone(),
            });
        }
        self.rebinder = Some(Rebinder::start(
            Arc::clone(&self.deps.ns),
            bindings,
            REBIND_INTERVAL,
        ));
    }

    async fn enable_events(&mut self) -> Result<StageOutcome, StageError> {
        let opts = self.descriptor.opts;
        if opts.no_events() {
            return Ok(StageOutcome::Success);
        }
        let token = self.deps.session.token();
        let dirs = EventDirs { receive: opts.events_in, send: opts.events_out };
        self.deps.events.start(dirs, token.as_ref()).await?;
        Ok(StageOutcome::Success)
    }

    /// Walk the cursor back to Start, undoing each stage that was
    /// reached. Errors are logged and never stop the walk.
    async fn do_cleanup(&mut self) {
        loop {
            let stage = self.handle.stage();
            if stage == Stage::Start {
                break;
            }
            if let Err(e) = self.cleanup_stage(stage).await {
                warn!(stage = %stage, "cleanup step failed, continuing: {}", e);
            }
            self.handle.set_stage(stage.prev().unwrap_or(Stage::Start));
        }
    }

    async fn cleanup_stage(&mut self, stage: Stage) -> Result<(), StageError> {
        match stage {
            Stage::Ready => {
                info!("{} shutting down", self.descriptor.descr);
                Ok(())
            }

            Stage::EnableEvents => {
                if !self.descriptor.opts.no_events() {
                    self.deps.events.stop().await;
                }
                Ok(())
            }

            Stage::StartRebinder => {
                if let Some(rebinder) = self.rebinder.take() {
                    rebinder.stop().await;
                }
                if let Some(binding) = self.admin_binding.clone() {
                    if let Err(e) = self.deps.ns.remove(&binding, CLEANUP_DEADLINE).await {
                        // The rebinder heartbeat on the peer side will
                        // garbage-collect the stale binding eventually.
                        warn!(binding = %binding, "could not remove admin binding: {}", e);
                    }
                }
                self.app.unbind_objects(self.deps.ns.as_ref()).await
            }

            Stage::PreBindInit => self.app.post_unbind_term().await,
            Stage::StartWorkers => self.app.stop_workers().await,

            Stage::RegSrvObjects => {
                self.registry.deregister(CORE_ADMIN_OBJECT);
                self.app.deregister_objects(&self.registry).await
            }

            Stage::PreRegInit => self.app.post_dereg_term().await,
            Stage::LoadConfig => self.app.store_config().await,

            // Undone at the client transport stage
            Stage::InitServerTransport => Ok(()),

            Stage::InstallLogger => {
                self.deps.logger.force_local();
                Ok(())
            }

            Stage::InitClientTransport => {
                if let Some(listener) = self.listener.take() {
                    listener.shutdown();
                }
                self.deps.logger.finalize();
                Ok(())
            }

            Stage::SetSigHandler => {
                if let Some(guard) = self.signal_guard.take() {
                    guard.remove();
                }
                Ok(())
            }

            Stage::CreateEvent => {
                if let Some(event) = self.handle.clear_event() {
                    event.destroy();
                }
                Ok(())
            }

            Stage::WaitPrereqs
            | Stage::LogIn
            | Stage::MakeDirs
            | Stage::ParseParams
            | Stage::LoadEnv
            | Stage::Start => Ok(()),
        }
    }

    fn env(&self) -> Result<&EnvInfo, StageError> {
        self.env_info.as_ref().ok_or_else(|| StageError::msg("environment info not loaded"))
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
