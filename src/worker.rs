//! Network calls run on background threads so the UI never waits on them.
//!
//! City searches and weather lookups each get their own thread, so a slow
//! weather fetch never holds up the suggestion list. Each thread only serves
//! the newest request queued for it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread;

use crate::cities::{City, CityClient};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::owm::current::CurrentWeather;
use crate::owm::forecast::ForecastEntry;
use crate::owm::OwmClient;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// `seq` lets the app drop answers to queries it has moved past.
    Cities { seq: u64, query: String },
    Weather { city: String },
}

#[derive(Debug)]
pub enum Response {
    Cities { seq: u64, result: Result<Vec<City>> },
    Weather { city: String, result: Result<Report> },
}

/// Current conditions plus one forecast entry per day.
///
/// The forecast is fetched after the current conditions and can fail on its
/// own; the current conditions are still worth showing when it does.
#[derive(Debug)]
pub struct Report {
    pub current: CurrentWeather,
    pub daily: Result<Vec<ForecastEntry>>,
}

pub trait Services: Send + Sync + 'static {
    fn search_cities(&self, query: &str) -> Result<Vec<City>>;
    fn current_by_name(&self, city: &str) -> Result<CurrentWeather>;
    fn daily_forecast_by_id(&self, id: u64) -> Result<Vec<ForecastEntry>>;
}

pub struct HttpServices {
    owm: OwmClient,
    cities: CityClient,
}

impl HttpServices {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            owm: OwmClient::new(config)?,
            cities: CityClient::new(config)?,
        })
    }
}

impl Services for HttpServices {
    fn search_cities(&self, query: &str) -> Result<Vec<City>> {
        self.cities.search(query)
    }

    fn current_by_name(&self, city: &str) -> Result<CurrentWeather> {
        self.owm.current_by_name(city)
    }

    fn daily_forecast_by_id(&self, id: u64) -> Result<Vec<ForecastEntry>> {
        self.owm.daily_forecast_by_id(id)
    }
}

/// Current weather by name, then the forecast for the ID it resolved to.
pub fn fetch_report<S: Services + ?Sized>(services: &S, city: &str) -> Result<Report> {
    let current = services.current_by_name(city)?;
    let daily = services.daily_forecast_by_id(current.id);
    match &daily {
        Ok(days) => tracing::info!(city, id = current.id, days = days.len(), "weather fetched"),
        Err(e) => tracing::warn!(city, id = current.id, error = %e, "forecast fetch failed"),
    }
    Ok(Report { current, daily })
}

fn handle<S: Services + ?Sized>(services: &S, request: Request) -> Response {
    match request {
        Request::Cities { seq, query } => {
            let result = services.search_cities(&query);
            if let Err(ref e) = result {
                tracing::error!(query = %query, error = %e, "city search failed");
            }
            Response::Cities { seq, result }
        }
        Request::Weather { city } => {
            let result = fetch_report(services, &city);
            if let Err(ref e) = result {
                tracing::error!(city = %city, error = %e, "weather fetch failed");
            }
            Response::Weather { city, result }
        }
    }
}

/// Drain the queue and keep only the last request in it.
fn newest(mut request: Request, requests: &Receiver<Request>) -> Request {
    while let Ok(newer) = requests.try_recv() {
        tracing::debug!(skipped = ?request, "request superseded");
        request = newer;
    }
    request
}

fn serve<S: Services>(
    services: Arc<S>,
    requests: Receiver<Request>,
    responses: Sender<Response>,
    stop: Arc<AtomicBool>,
) {
    while let Ok(first) = requests.recv() {
        let request = newest(first, &requests);
        if stop.load(Ordering::Relaxed) {
            break;
        }
        let response = handle(services.as_ref(), request);
        if stop.load(Ordering::Relaxed) || responses.send(response).is_err() {
            break;
        }
    }
    tracing::debug!(thread = ?thread::current().name(), "worker stopped");
}

fn spawn_loop<S: Services>(
    name: &str,
    services: &Arc<S>,
    responses: &Sender<Response>,
    stop: &Arc<AtomicBool>,
) -> Result<Sender<Request>> {
    let (tx, rx) = mpsc::channel();
    let services = Arc::clone(services);
    let responses = responses.clone();
    let stop = Arc::clone(stop);
    thread::Builder::new()
        .name(name.to_string())
        .spawn(move || serve(services, rx, responses, stop))
        .map_err(Error::Spawn)?;
    Ok(tx)
}

pub struct Worker {
    searches: Sender<Request>,
    lookups: Sender<Request>,
    responses: Receiver<Response>,
    stop: Arc<AtomicBool>,
}

impl Worker {
    pub fn spawn<S: Services>(services: S) -> Result<Self> {
        let services = Arc::new(services);
        let stop = Arc::new(AtomicBool::new(false));
        let (resp_tx, resp_rx) = mpsc::channel();
        let searches = spawn_loop("search", &services, &resp_tx, &stop)?;
        let lookups = spawn_loop("weather", &services, &resp_tx, &stop)?;

        Ok(Self {
            searches,
            lookups,
            responses: resp_rx,
            stop,
        })
    }

    pub fn send(&self, request: Request) -> Result<()> {
        tracing::debug!(?request, "queueing request");
        let queue = match request {
            Request::Cities { .. } => &self.searches,
            Request::Weather { .. } => &self.lookups,
        };
        queue.send(request).map_err(|_| Error::WorkerGone)
    }

    pub fn try_recv(&self) -> Result<Option<Response>> {
        match self.responses.try_recv() {
            Ok(response) => Ok(Some(response)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(Error::WorkerGone),
        }
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        // Threads are not joined. A request in flight finishes on its own,
        // its answer is discarded, and nothing queued behind it runs.
        self.stop.store(true, Ordering::Relaxed);
    }
}
