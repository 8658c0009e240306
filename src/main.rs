mod config;
mod display;
mod localization;
mod sources;
mod widget;

use config::{Config, ConfigError};
use log::*;
use sources::aladhan::AladhanCalendar;
use sources::forecast::OpenMeteoForecast;
use sources::geo_time;
use sources::ip_location::IpLocator;
use sources::nominatim::NominatimReverse;
use std::future::Future;
use std::io::Write;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use widget::clock::{Clock, SystemClock};
use widget::countdown::{self, CountdownValue};
use widget::location::{FixedDevice, LocationDevice, LocationError, LocationProvider};
use widget::ramadan::RamadanDateResolver;
use widget::session::{MemorySession, SessionStore};
use widget::weather::{WeatherProvider, WeatherSnapshot};


// custom error type used throughout the project
#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to create HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("{0}")]
    Location(#[from] LocationError),

    #[error("Failed to write to the terminal: {0}")]
    Terminal(#[from] std::io::Error),
}

/// Everything the terminal shows, in the order it happens
enum Update {
    Countdown(CountdownValue),
    Weather(WeatherSnapshot),
}


#[tokio::main]
async fn main() {
    env_logger::init();

    if let Err(e) = run().await {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Error> {
    let config = Config::from_env()?;
    localization::set_language(config.language.clone());
    debug!("Starting with {:?}", config);

    let http_client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .timeout(config.http_timeout)
        .build()?;

    let session: Arc<dyn SessionStore> = Arc::new(MemorySession::new());
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let device: Arc<dyn LocationDevice> = match config.coordinates {
        Some(coordinates) => Arc::new(FixedDevice(Some(coordinates))),
        None => Arc::new(IpLocator::new(http_client.clone(), &config.ip_location_url)),
    };
    let location = LocationProvider::new(device, session.clone());
    let point = match location.resolve().await {
        Ok(point) => point,
        Err(e) => {
            println!("{}", display::location_error(&e));
            return Err(e.into());
        }
    };

    // loading the timezone polygons is blocking work, overlap it with the network calls
    let local_zone = tokio::task::spawn_blocking(move || {
        geo_time::init();
        geo_time::get_timezone(&point)
    });

    let (updates, pending) = mpsc::unbounded_channel();

    let weather = WeatherProvider::new(
        Arc::new(OpenMeteoForecast::new(http_client.clone(), &config.weather_url)),
        Arc::new(NominatimReverse::new(http_client.clone(), &config.location_url)),
    );
    let weather_updates = updates.clone();
    let _weather_task = weather.start(point,
        move |snapshot| { let _ = weather_updates.send(Update::Weather(snapshot)); },
        config.weather_refresh);

    let calendar = AladhanCalendar::new(http_client.clone(), &config.calendar_url, config.calendar_method);
    let resolver = RamadanDateResolver::new(Arc::new(calendar), session.clone(), clock.clone());
    let resolved = resolver.resolve(point).await;

    let local_zone = local_zone.await.unwrap_or_else(|e| {
        warn!("Timezone lookup for {} failed: {}", point, e);
        None
    });
    for line in display::header(&resolved, local_zone) {
        println!("{}", line);
    }
    println!("{}", localization::localize!("blessing"));

    let countdown_updates = updates.clone();
    let _countdown_task = countdown::start(resolved.date, clock.clone(),
        move |left| { let _ = countdown_updates.send(Update::Countdown(left)); });
    drop(updates);

    print_updates(&mut std::io::stdout(), pending, tokio::signal::ctrl_c()).await
}

/// Writes updates until every producer is gone or `shutdown` completes. The countdown keeps
/// rewriting its own line, weather lines are printed above it.
async fn print_updates<W, S>(out: &mut W, mut pending: mpsc::UnboundedReceiver<Update>, shutdown: S)
                             -> Result<(), Error>
where
    W: Write,
    S: Future,
{
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            update = pending.recv() => match update {
                Some(Update::Countdown(left)) => {
                    write!(out, "\r{}\x1b[K", display::countdown(&left))?;
                    out.flush()?;
                }
                Some(Update::Weather(snapshot)) => {
                    writeln!(out, "\r{}\x1b[K", display::weather(&snapshot))?;
                }
                None => break,
            },
            _ = &mut shutdown => {
                writeln!(out)?;
                info!("Interrupted, shutting down");
                break;
            }
        }
    }

    Ok(())
}
