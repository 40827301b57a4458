mod cli;
#[cfg_attr(not(feature = "hardware-pcsc"), allow(dead_code))]
mod devices;
mod error;

use clap::Parser;
use nfcuid_core::constants::{MQTT_DISCONNECT_GRACE_MS, SHUTDOWN_GRACE_MS};
use nfcuid_core::{Config, DeviceSelection, InputMode, OutputTarget};
use nfcuid_hardware::{AnyKeyboard, ConsoleKeyboard};
use nfcuid_network::{MqttConnection, TcpSink};
use nfcuid_service::{OutputDispatcher, OutputSink, Service};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::error::{CliError, exit_code};

#[tokio::main]
async fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // --help and --version land here too
            let code = if err.use_stderr() {
                exit_code::FAILURE
            } else {
                exit_code::SUCCESS
            };
            let _ = err.print();
            std::process::exit(code);
        }
    };

    init_tracing(cli.debug);

    if let Err(err) = run(cli.into_config()).await {
        eprintln!("{err}");
        std::process::exit(err.exit_code());
    }
}

fn init_tracing(debug: bool) {
    let filter = if debug { "debug" } else { "info" };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();
}

async fn run(config: Config) -> Result<(), CliError> {
    config.validate()?;
    debug!(
        config = %serde_json::to_string(&config).unwrap_or_default(),
        "Starting nfcuid {}",
        nfcuid_core::VERSION
    );

    let mut mqtt = connect_mqtt(&config).await?;
    let sink = build_sink(&config, mqtt.as_ref());
    let mut service = Service::new(config.clone(), OutputDispatcher::new(sink));

    let cancel = CancellationToken::new();
    let result = match config.input {
        InputMode::Mqtt { .. } => match mqtt.as_mut().and_then(MqttConnection::take_inbound) {
            Some(inbound) => {
                let _signals = SignalListener::spawn(cancel.clone());
                service
                    .run_mqtt(inbound, cancel.clone())
                    .await
                    .map_err(CliError::from)
            }
            None => Err(nfcuid_core::Error::MissingConfig("mqtt-server".to_string()).into()),
        },
        InputMode::Reader { device } => run_reader(&mut service, device, cancel.clone()).await,
    };

    if let Some(connection) = mqtt {
        connection
            .disconnect(Duration::from_millis(MQTT_DISCONNECT_GRACE_MS))
            .await;
        if cancel.is_cancelled() {
            println!("Disconnected from server");
        }
    }

    result?;
    if cancel.is_cancelled() {
        return Err(CliError::Interrupted);
    }
    Ok(())
}

/// Open the broker session when input or output goes through MQTT.
async fn connect_mqtt(config: &Config) -> Result<Option<MqttConnection>, CliError> {
    let Some(mqtt) = config.mqtt.as_ref().filter(|_| config.uses_mqtt()) else {
        return Ok(None);
    };

    let subscribe = match &config.input {
        InputMode::Mqtt { topic } => Some(topic.as_str()),
        InputMode::Reader { .. } => None,
    };

    info!(
        broker = %mqtt.broker_url(),
        user = mqtt.username.as_deref().unwrap_or(""),
        topic = subscribe.unwrap_or(""),
        "Using MQTT"
    );
    Ok(Some(MqttConnection::connect(mqtt, subscribe).await?))
}

fn build_sink(config: &Config, mqtt: Option<&MqttConnection>) -> OutputSink {
    match (&config.output, mqtt) {
        (OutputTarget::MqttPublish { topic }, Some(connection)) => {
            OutputSink::MqttPublish(connection.publisher(topic.clone()))
        }
        (OutputTarget::Tcp(tcp), _) => OutputSink::Tcp(TcpSink::new(tcp)),
        // validate() guarantees a broker whenever MQTT output is selected
        _ => OutputSink::Keyboard(keyboard(config.debug)),
    }
}

fn keyboard(debug: bool) -> AnyKeyboard {
    if debug {
        return AnyKeyboard::Console(ConsoleKeyboard::new());
    }

    match AnyKeyboard::system() {
        Ok(keyboard) => keyboard,
        Err(e) => {
            warn!("{}; printing output instead", e);
            AnyKeyboard::Console(ConsoleKeyboard::new())
        }
    }
}

#[cfg(feature = "hardware-pcsc")]
async fn run_reader(
    service: &mut Service,
    selection: DeviceSelection,
    cancel: CancellationToken,
) -> Result<(), CliError> {
    use nfcuid_hardware::{PcscContext, ReaderContext};

    let ctx = PcscContext::establish()?;
    let readers = ctx.list_readers().await?;
    let reader = devices::select_reader(&readers, selection)?;

    // Listen only after the prompt so Ctrl-C still aborts it.
    let _signals = SignalListener::spawn(cancel.clone());
    service.run_reader(&ctx, &reader, cancel).await?;
    Ok(())
}

#[cfg(not(feature = "hardware-pcsc"))]
async fn run_reader(
    _service: &mut Service,
    _selection: DeviceSelection,
    _cancel: CancellationToken,
) -> Result<(), CliError> {
    Err(nfcuid_hardware::HardwareError::unsupported(
        "reading cards requires a build with the hardware-pcsc feature",
    )
    .into())
}

/// Background task turning shutdown signals into cancellation; stops
/// listening when dropped.
struct SignalListener(tokio::task::JoinHandle<()>);

impl SignalListener {
    fn spawn(cancel: CancellationToken) -> Self {
        Self(tokio::spawn(wait_for_shutdown(cancel)))
    }
}

impl Drop for SignalListener {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Cancel `cancel` on Ctrl-C or, on Unix, SIGTERM.
///
/// If the run has not wound down within [`SHUTDOWN_GRACE_MS`], or a second
/// Ctrl-C arrives, the process exits with status 1.
async fn wait_for_shutdown(cancel: CancellationToken) {
    tokio::select! {
        _ = ctrl_c() => {}
        _ = terminate() => {}
    }

    info!("Shutting down");
    cancel.cancel();

    tokio::select! {
        _ = tokio::time::sleep(Duration::from_millis(SHUTDOWN_GRACE_MS)) => {
            warn!("Shutdown grace period ({}ms) expired, exiting", SHUTDOWN_GRACE_MS);
        }
        _ = ctrl_c() => warn!("Interrupted again, exiting"),
    }
    std::process::exit(exit_code::FAILURE);
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

#[cfg(unix)]
async fn terminate() {
    use tokio::signal::unix::{SignalKind, signal};
    match signal(SignalKind::terminate()) {
        Ok(mut stream) => {
            stream.recv().await;
        }
        Err(e) => {
            warn!("Failed to listen for SIGTERM: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn terminate() {
    std::future::pending::<()>().await;
}
