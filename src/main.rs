mod config;
mod http;
mod ip;
mod notify;
mod provider;
mod reconcile;
mod util;

use std::fs::File;
use std::io::Read;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;
use std::time::Duration;

use log::LevelFilter;
use simple_logger::SimpleLogger;

use config::{Config, General};
use ip::Resolver;
use notify::Notifier;
use provider::porkbun::Porkbun;
use provider::{ProviderError, RecordApi, ZoneTarget};
use reconcile::Outcome;

const CONFIG_PATHS: [&'static str; 2] = [
    "./config.toml",
    #[cfg(target_family = "unix")]
    "/etc/zonemend/config.toml",
];

/// This stores config values specified inside the [general] section of
/// config.toml. The HTTP layer reads the user agent and timeout from here.
static GENERAL_CONFIG: OnceLock<General> = OnceLock::new();

/// Set from the signal handler. Checked between ticks only; a tick that is
/// underway always runs to completion, since the provider cannot abort a
/// half-applied operation.
static SHUTDOWN: AtomicBool = AtomicBool::new(false);

#[cfg(target_family = "unix")]
extern "C" fn request_shutdown(_signal: libc::c_int) {
    SHUTDOWN.store(true, Ordering::SeqCst);
}

#[cfg(target_family = "unix")]
fn install_signal_handlers() {
    unsafe {
        libc::signal(libc::SIGINT, request_shutdown as libc::sighandler_t);
        libc::signal(libc::SIGTERM, request_shutdown as libc::sighandler_t);
    }
}

#[cfg(not(target_family = "unix"))]
fn install_signal_handlers() {}

/// Sleeps in one-second slices so a termination signal is noticed promptly.
/// Returns true once shutdown has been requested.
fn sleep_until_next_tick(seconds: u64) -> bool {
    for _ in 0..seconds {
        if SHUTDOWN.load(Ordering::SeqCst) {
            return true;
        }

        std::thread::sleep(Duration::from_secs(1));
    }

    SHUTDOWN.load(Ordering::SeqCst)
}

/// A reconciliation target plus its halt state. A target halted by a fatal
/// error stays halted until the operator fixes the configuration and
/// restarts; the condition is re-logged every tick so it cannot go
/// unnoticed.
struct ManagedTarget {
    zone: ZoneTarget,
    halted: Option<ProviderError>,
}

fn run_target(
    api: &dyn RecordApi,
    resolver: &Resolver,
    notifier: Option<&Notifier>,
    target: &mut ManagedTarget,
) {
    if let Some(error) = &target.halted {
        log::error!(
            "{}: halted until the configuration is fixed: {}",
            target.zone,
            error
        );
        return;
    }

    let current_ip = match resolver.fetch() {
        Ok(ip) => ip,
        Err(e) => {
            log::error!(
                "{}: unable to resolve our public IP, will retry next tick: {}",
                target.zone,
                e
            );
            return;
        }
    };

    match reconcile::reconcile(api, &target.zone, current_ip) {
        Ok(Outcome::Unchanged) => {
            log::debug!("{}: {}", target.zone, Outcome::Unchanged);
        }

        Ok(outcome) => {
            log::info!("{}: {}", target.zone, outcome);

            if let Some(notifier) = notifier {
                notifier.send(&format!(
                    "{}: {} (now {})",
                    target.zone, outcome, current_ip
                ));
            }
        }

        Err(e) if e.is_fatal() => {
            log::error!("{}: fatal error, halting this target: {}", target.zone, e);

            if let Some(notifier) = notifier {
                notifier.send(&format!("{}: halted after fatal error: {}", target.zone, e));
            }

            target.halted = Some(e);
        }

        Err(e) => {
            log::error!(
                "{}: reconciliation failed, will retry next tick: {}",
                target.zone,
                e
            );
        }
    }
}

fn main() {
    let mut config_str = String::new();

    for path in CONFIG_PATHS {
        let mut file = match File::open(path) {
            Ok(f) => f,
            Err(_) => continue,
        };

        match file.read_to_string(&mut config_str) {
            Ok(_) => break,
            Err(e) => println!("Unable to read config file, reason: {}", e.to_string()),
        }
    }

    if config_str.is_empty() {
        println!("No configuration found. Quitting.");
        return;
    }

    let config = match toml::from_str::<Config>(config_str.as_str()) {
        Ok(conf) => conf,
        Err(e) => return println!("{}", e.to_string()),
    };

    SimpleLogger::new()
        .with_level(LevelFilter::Info)
        .env()
        .init()
        .unwrap();

    let update_rate = config.general.update_rate;

    log::info!(
        "zonemend v{} started, reconciling every {} second(s)",
        env!("CARGO_PKG_VERSION"),
        update_rate.map(|x| u32::from(x)).unwrap_or(0)
    );

    // It's safe to unwrap here - the program is single-threaded and nothing
    // reads GENERAL_CONFIG before this point.
    GENERAL_CONFIG.set(config.general).unwrap();

    let resolver = Resolver::new(GENERAL_CONFIG.get().unwrap().echo_url.clone());
    let client = Porkbun::new(config.provider.api_key, config.provider.secret_api_key);
    let notifier = config.notify.as_ref().map(Notifier::from_config);

    // Fan each [[zone]] entry out into one target per subdomain. Targets
    // are independent of each other from here on.
    let mut targets = Vec::new();
    for zone in &config.zones {
        for subdomain in &zone.subdomains {
            targets.push(ManagedTarget {
                zone: ZoneTarget {
                    domain: zone.domain.clone(),
                    subdomain: subdomain.clone(),
                    ttl: zone.ttl,
                },
                halted: None,
            });
        }
    }

    if targets.is_empty() {
        println!("No zones were configured. Quitting.");
        return;
    }

    install_signal_handlers();

    // Main loop here
    loop {
        for target in &mut targets {
            run_target(&client, &resolver, notifier.as_ref(), target);
        }

        let Some(sleep_for) = &update_rate else {
            break; // 0 timeout makes this a fire-once program.
        };

        if sleep_until_next_tick(u64::from(u32::from(*sleep_for))) {
            log::info!("shutdown requested, exiting");
            break;
        }
    }
}
