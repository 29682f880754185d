//! Starting and connecting the extension host.

use mapped_edits_core::{MappedEditsError, Result, UriIdentity, UriIdentityService};
use mapped_edits_ext_host::ExtensionHost;
use mapped_edits_rpc::{Connection, ExtHostProxy, MainThreadDispatcher};
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::config::MappedEditsConfig;
use crate::main_thread::MainThreadMappedEdits;
use crate::service::MappedEditsService;

const DUPLEX_BUFFER_SIZE: usize = 64 * 1024;

/// A running extension host and the main side's end of its connection.
///
/// When the connection closes every remote provider is dropped from the
/// service.
pub struct ExtHostLink {
    proxy: Arc<ExtHostProxy>,
    main_thread: Arc<MainThreadMappedEdits>,
    tasks: Vec<JoinHandle<()>>,
    child: Mutex<Option<Child>>,
}

impl ExtHostLink {
    /// Starts the extension host described by `config`.
    ///
    /// Without `extHost.command` the host runs on this runtime over an
    /// in-memory pipe; otherwise it is spawned as a child process speaking
    /// the protocol on its stdio.
    pub fn launch(
        config: &MappedEditsConfig,
        service: Arc<MappedEditsService>,
        identity: Arc<dyn UriIdentity>,
    ) -> Result<Self> {
        match &config.ext_host.command {
            Some(program) => Self::spawn_process(program, config, service, identity),
            None => Self::start_in_process(config, service, identity),
        }
    }

    fn start_in_process(
        config: &MappedEditsConfig,
        service: Arc<MappedEditsService>,
        identity: Arc<dyn UriIdentity>,
    ) -> Result<Self> {
        let (main_io, host_io) = tokio::io::duplex(DUPLEX_BUFFER_SIZE);

        let (host_reader, host_writer) = tokio::io::split(host_io);
        let host_identity = Arc::new(UriIdentityService::new(config.ignore_path_casing));
        let host = ExtensionHost::new(host_reader, host_writer, host_identity);
        if config.builtin_providers {
            host.register_builtin_providers()?;
        }
        let host_task = tokio::spawn(async move {
            if let Err(e) = host.serve().await {
                tracing::error!("in-process extension host stopped: {}", e);
            }
        });

        let (main_reader, main_writer) = tokio::io::split(main_io);
        let mut link = Self::connect(main_reader, main_writer, service, identity, None);
        link.tasks.push(host_task);

        tracing::info!("extension host running in-process");
        Ok(link)
    }

    fn spawn_process(
        program: &str,
        config: &MappedEditsConfig,
        service: Arc<MappedEditsService>,
        identity: Arc<dyn UriIdentity>,
    ) -> Result<Self> {
        let mut command = Command::new(program);
        command.args(&config.ext_host.args);
        if config.ignore_path_casing {
            command.arg("--ignore-path-casing");
        }
        if !config.builtin_providers {
            command.arg("--no-builtin-providers");
        }

        let mut child = command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| MappedEditsError::protocol("extension host stdin not captured"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| MappedEditsError::protocol("extension host stdout not captured"))?;

        tracing::info!("extension host started: {} (pid {:?})", program, child.id());
        Ok(Self::connect(stdout, stdin, service, identity, Some(child)))
    }

    fn connect<R, W>(
        reader: R,
        writer: W,
        service: Arc<MappedEditsService>,
        identity: Arc<dyn UriIdentity>,
        child: Option<Child>,
    ) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (peer, connection) = Connection::new(reader, writer);
        let proxy = Arc::new(ExtHostProxy::new(peer));
        let main_thread = Arc::new(MainThreadMappedEdits::new(service, proxy.clone(), identity));

        let dispatcher = Arc::new(MainThreadDispatcher::new(main_thread.clone()));
        let registrations = main_thread.clone();
        let connection_task = tokio::spawn(async move {
            match connection.serve(dispatcher).await {
                Ok(()) => tracing::info!("extension host disconnected"),
                Err(e) => tracing::error!("extension host connection failed: {}", e),
            }
            registrations.dispose();
        });

        Self {
            proxy,
            main_thread,
            tasks: vec![connection_task],
            child: Mutex::new(child),
        }
    }

    /// The extension host as a remote shape.
    pub fn proxy(&self) -> Arc<ExtHostProxy> {
        Arc::clone(&self.proxy)
    }

    pub fn main_thread(&self) -> &MainThreadMappedEdits {
        &self.main_thread
    }

    /// Stops the extension host and drops its providers.
    pub async fn shutdown(&self) {
        for task in &self.tasks {
            task.abort();
        }
        if let Some(mut child) = self.child.lock().await.take()
            && let Err(e) = child.kill().await
        {
            tracing::warn!("failed to stop extension host process: {}", e);
        }
        self.main_thread.dispose();
    }
}

impl Drop for ExtHostLink {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mapped_edits_core::{DocumentFilter, MainThreadMappedEditsShape, ProviderHandle};
    use std::time::Duration;

    use crate::test_utils::test_helpers::wait_for_providers;

    fn service() -> (Arc<MappedEditsService>, Arc<dyn UriIdentity>) {
        let identity: Arc<dyn UriIdentity> = Arc::new(UriIdentityService::default());
        (Arc::new(MappedEditsService::new(identity.clone())), identity)
    }

    #[tokio::test]
    async fn test_in_process_host_registers_builtins() {
        let (service, identity) = service();
        let link = ExtHostLink::launch(&MappedEditsConfig::default(), service.clone(), identity)
            .unwrap();

        wait_for_providers(&service, 1).await;
        assert_eq!(link.main_thread().registered_count(), 1);

        link.shutdown().await;
        assert_eq!(service.provider_count(), 0);
    }

    #[tokio::test]
    async fn test_builtins_can_be_disabled() {
        let (service, identity) = service();
        let config = MappedEditsConfig {
            builtin_providers: false,
            ..Default::default()
        };
        let link = ExtHostLink::launch(&config, service.clone(), identity).unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(service.provider_count(), 0);
        link.shutdown().await;
    }

    #[tokio::test]
    async fn test_shutdown_drops_remote_providers() {
        let (service, identity) = service();
        let config = MappedEditsConfig {
            builtin_providers: false,
            ..Default::default()
        };
        let link = ExtHostLink::launch(&config, service.clone(), identity).unwrap();
        link.main_thread()
            .register_provider(ProviderHandle::new(9), vec![DocumentFilter::language("*")])
            .unwrap();
        assert_eq!(service.provider_count(), 1);

        link.shutdown().await;
        assert_eq!(service.provider_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_command_fails_to_launch() {
        let (service, identity) = service();
        let mut config = MappedEditsConfig::default();
        config.ext_host.command = Some("/nonexistent/mapped-edits-ext-host".into());

        let result = ExtHostLink::launch(&config, service, identity);
        assert!(matches!(result, Err(MappedEditsError::Io(_))));
    }
}
