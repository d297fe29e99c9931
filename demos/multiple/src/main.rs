//! Multiple observers demo
//!
//! Runs a set of publisher threads that periodically update one property and
//! a set of observer threads that each follow it through their own stream.
//! After the configured duration a shared cancel token stops everything.
//!
//! Run with:
//! ```sh
//! cargo run -p multiple [demos/multiple/demo.ron]
//! ```
//!
//! Set `verbose: true` in the config to see the library's trace events.

mod config;
mod error;

use config::DemoConfig;
use observer_core::{CancelToken, Property};
use std::thread;
use tracing::{error, info, Level};

fn run_publisher(id: usize, prop: Property<i64>, config: DemoConfig, token: CancelToken) {
    let mut value = prop.value();
    loop {
        thread::sleep(config.interval());
        if token.is_done() {
            break;
        }
        value += 1;
        prop.update(value);
        info!(publisher = id, value, "published");
    }
}

fn run_observer(id: usize, prop: Property<i64>, token: CancelToken) -> usize {
    let mut stream = prop.observe();
    let mut seen = 0;
    loop {
        info!(
            observer = id,
            value = *stream.value(),
            version = stream.version(),
            "observed"
        );
        match stream.wait_next_ctx(&token) {
            Ok(_) => seen += 1,
            Err(_) => break,
        }
    }
    seen
}

fn main() {
    let loaded = std::env::args().nth(1).map(DemoConfig::load);
    let verbose = matches!(&loaded, Some(Ok(config)) if config.verbose);

    tracing_subscriber::fmt()
        .with_max_level(if verbose { Level::TRACE } else { Level::INFO })
        .init();

    let config = match loaded {
        Some(Ok(config)) => config,
        Some(Err(err)) => {
            error!(%err, "could not load config");
            std::process::exit(1);
        }
        None => DemoConfig::default(),
    };
    info!(?config, "starting");

    let prop = Property::new(config.initial);
    let token = CancelToken::with_timeout(config.duration());

    let observers: Vec<_> = (0..config.observers)
        .map(|id| {
            let prop = prop.clone();
            let token = token.clone();
            thread::spawn(move || run_observer(id, prop, token))
        })
        .collect();

    let publishers: Vec<_> = (0..config.publishers)
        .map(|id| {
            let prop = prop.clone();
            let token = token.clone();
            let config = config.clone();
            thread::spawn(move || run_publisher(id, prop, config, token))
        })
        .collect();

    for publisher in publishers {
        if publisher.join().is_err() {
            error!("publisher thread panicked");
        }
    }
    for (id, observer) in observers.into_iter().enumerate() {
        match observer.join() {
            Ok(seen) => info!(observer = id, seen, "observer finished"),
            Err(_) => error!(observer = id, "observer thread panicked"),
        }
    }

    info!(final_value = prop.value(), updates = prop.version(), "done");
}
