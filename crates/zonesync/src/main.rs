// # zonesync - DNS zone reconciliation
//
// This binary is a THIN integration layer: all planning and provider logic
// lives in zonesync-core and the provider crates.
//
// It is responsible for:
// 1. Reading settings from environment variables
// 2. Loading and validating the zone configuration file
// 3. Registering providers and building the configured one
// 4. Previewing or pushing corrections for every configured domain
//
// ## Configuration
//
// - `ZONESYNC_CONFIG`: Path to the JSON configuration file (required)
// - `ZONESYNC_PROVIDER_API_KEY`: Provider API key, overrides the file
// - `ZONESYNC_MODE`: `preview` (default) prints corrections, `push` applies them
// - `ZONESYNC_LOG_LEVEL`: trace, debug, info (default), warn, error
//
// ## Example
//
// ```bash
// export ZONESYNC_CONFIG=/etc/zonesync/zones.json
// export ZONESYNC_PROVIDER_API_KEY=your_key
// export ZONESYNC_MODE=push
//
// zonesync
// ```

use anyhow::{Context, Result};
use std::env;
use std::process::ExitCode;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;
use zonesync_core::{EngineEvent, ProviderConfig, ProviderRegistry, Reconciler, ZonesyncConfig};

/// Exit codes for different termination scenarios
///
/// - 0: Every domain previewed or pushed successfully
/// - 1: Configuration or startup error
/// - 2: Runtime error (fetch/planning failure or a failed correction)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ZonesyncExitCode {
    /// Clean exit
    Success = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error
    RuntimeError = 2,
}

impl From<ZonesyncExitCode> for ExitCode {
    fn from(code: ZonesyncExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// What to do with planned corrections
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Print corrections only
    Preview,
    /// Apply corrections
    Push,
}

/// Settings read from the environment
struct Settings {
    config_path: String,
    api_key: Option<String>,
    mode: Mode,
    log_level: Level,
}

impl Settings {
    /// Load settings from environment variables
    fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let config_path = lookup("ZONESYNC_CONFIG")
            .filter(|p| !p.is_empty())
            .context(
                "ZONESYNC_CONFIG is required. \
                Set it via: export ZONESYNC_CONFIG=/path/to/zones.json",
            )?;

        let mode = match lookup("ZONESYNC_MODE")
            .unwrap_or_else(|| "preview".to_string())
            .to_lowercase()
            .as_str()
        {
            "preview" => Mode::Preview,
            "push" => Mode::Push,
            other => anyhow::bail!(
                "ZONESYNC_MODE '{}' is not valid. Valid modes: preview, push",
                other
            ),
        };

        let log_level = match lookup("ZONESYNC_LOG_LEVEL")
            .unwrap_or_else(|| "info".to_string())
            .to_lowercase()
            .as_str()
        {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            other => anyhow::bail!(
                "ZONESYNC_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                other
            ),
        };

        Ok(Self {
            config_path,
            api_key: lookup("ZONESYNC_PROVIDER_API_KEY").filter(|k| !k.is_empty()),
            mode,
            log_level,
        })
    }

    /// Load the configuration file and apply environment overrides
    fn load_config(&self) -> Result<ZonesyncConfig> {
        let mut config = ZonesyncConfig::from_json_file(&self.config_path)
            .with_context(|| format!("loading {}", self.config_path))?;

        if let Some(key) = &self.api_key {
            match &mut config.provider {
                ProviderConfig::Gcore { api_key, .. } => *api_key = key.clone(),
                other => warn!(
                    "ZONESYNC_PROVIDER_API_KEY ignored for provider type {}",
                    other.type_name()
                ),
            }
        }

        config.validate()?;
        Ok(config)
    }
}

fn main() -> ExitCode {
    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return ZonesyncExitCode::ConfigError.into();
        }
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(settings.log_level)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return ZonesyncExitCode::ConfigError.into();
    }

    let config = match settings.load_config() {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration validation error: {:#}", e);
            return ZonesyncExitCode::ConfigError.into();
        }
    };

    info!(
        "Loaded {} domain(s) for provider {} [mode: {:?}]",
        config.domains.len(),
        config.provider.type_name(),
        settings.mode
    );

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return ZonesyncExitCode::RuntimeError.into();
        }
    };

    rt.block_on(async {
        tokio::select! {
            code = run(config, settings.mode) => code,
            _ = tokio::signal::ctrl_c() => {
                warn!("Interrupted; corrections already applied stay applied");
                ZonesyncExitCode::RuntimeError
            }
        }
    })
    .into()
}

/// Build the provider and reconcile every domain
async fn run(config: ZonesyncConfig, mode: Mode) -> ZonesyncExitCode {
    let registry = ProviderRegistry::with_builtin();

    #[cfg(feature = "gcore")]
    {
        debug!("Registering G-Core provider");
        zonesync_provider_gcore::register(&registry);
    }

    let provider = match registry.create_provider(&config.provider) {
        Ok(provider) => provider,
        Err(e) => {
            error!(
                "Cannot create provider {} (available: {}): {}",
                config.provider.type_name(),
                registry.list_providers().join(", "),
                e
            );
            return ZonesyncExitCode::ConfigError;
        }
    };
    let provider_name = provider.provider_name();

    let (reconciler, mut events) = match Reconciler::new(provider, config.engine.clone()) {
        Ok(pair) => pair,
        Err(e) => {
            error!("Cannot start reconciler: {}", e);
            return ZonesyncExitCode::ConfigError;
        }
    };

    let event_logger = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            log_event(&event);
        }
    });

    let mut code = ZonesyncExitCode::Success;
    for domain in &config.domains {
        if let Err(e) = reconcile_domain(&reconciler, domain, provider_name, mode).await {
            error!("{}: {:#}", domain.name, e);
            code = ZonesyncExitCode::RuntimeError;
        }
    }

    // closing the sender lets the logger drain and stop
    drop(reconciler);
    let _ = event_logger.await;
    code
}

async fn reconcile_domain(
    reconciler: &Reconciler,
    domain: &zonesync_core::DomainConfig,
    provider_name: &str,
    mode: Mode,
) -> Result<()> {
    println!("******************** Domain: {}", domain.name);

    match mode {
        Mode::Preview => {
            let corrections = reconciler.plan(domain).await?;
            println!("----- {}: {} correction(s)", provider_name, corrections.len());
            for (i, correction) in corrections.iter().enumerate() {
                println!("#{}: {}", i + 1, correction.msg);
            }
        }
        Mode::Push => {
            let report = reconciler.reconcile(domain).await?;
            println!(
                "----- {}: {} of {} correction(s) applied",
                provider_name, report.applied, report.planned
            );
            for failure in &report.failures {
                println!("#{}: FAILURE! {}", failure.index + 1, failure.error);
            }
            report.into_result()?;
        }
    }

    let nameservers = reconciler.nameservers(&domain.name).await?;
    if !nameservers.is_empty() {
        info!("{} nameservers: {}", domain.name, nameservers.join(", "));
    }
    Ok(())
}

fn log_event(event: &EngineEvent) {
    match event {
        EngineEvent::ZoneCreated { zone } => info!("Zone {} created", zone),
        EngineEvent::CorrectionFailed {
            index,
            error,
            retry_count,
            ..
        } => warn!(
            "Correction #{} failed after {} retries: {}",
            index + 1,
            retry_count,
            error
        ),
        other => debug!("Engine event: {:?}", other),
    }
}
