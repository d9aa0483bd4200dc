#[macro_use] extern crate log;
extern crate env_logger;

use std::env;
use std::error::Error;
use std::path::Path;

use async_std::task;

use driver_overlay::config::OverlayConfig;
use driver_overlay::overlay::{ Overlay, StateUpdater, TextSlot };
use driver_overlay::{ AnimatorHandle, CycleAnimator, Update, start_driver_polling };

const DEFAULT_CONFIG: &str = "overlay.yaml";

fn main() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    if let Err(err) = run() {
        error!("{}", err);
        std::process::exit(1);
    }
}

fn load_config() -> Result<OverlayConfig, Box<dyn Error>> {
    match env::args().nth(1) {
        Some(path) => Ok(OverlayConfig::load(Path::new(&path))?),
        None if Path::new(DEFAULT_CONFIG).exists() => Ok(OverlayConfig::load(Path::new(DEFAULT_CONFIG))?),
        None => {
            info!("No {} found, using built-in defaults", DEFAULT_CONFIG);
            Ok(OverlayConfig::default())
        },
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let config = load_config()?;

    let slots: Vec<Box<dyn Overlay + Send>> = config.slots.iter()
        .map(|slot| Box::new(TextSlot::new(&slot.name, &slot.template)) as Box<dyn Overlay + Send>)
        .collect();
    let animator = AnimatorHandle::new(CycleAnimator::new(slots, config.timings)?);

    let (sender, receiver) = async_std::channel::unbounded();
    let poller = start_driver_polling(&config.endpoint.host, config.endpoint.port, config.poll_interval, move |result| {
        if sender.try_send(Update::from(result)).is_err() {
            warn!("Overlay is gone, dropping driver update");
        }
    })?;

    animator.start();

    task::block_on(async {
        let mut online: Option<bool> = None;
        while let Ok(update) = receiver.recv().await {
            match &update {
                Update::Driver(snapshot) => {
                    if online != Some(true) {
                        info!("Receiving data for {} (#{})", snapshot.driver_name, snapshot.driver_number);
                    }
                    online = Some(true);
                },
                Update::Offline(reason) => {
                    if online != Some(false) {
                        warn!("Driver data unavailable: {}", reason);
                    } else {
                        debug!("Driver data unavailable: {}", reason);
                    }
                    online = Some(false);
                },
            }

            animator.with_slots(|slots| {
                for slot in slots.iter_mut() {
                    slot.update_state(&update);
                }
            });
        }
    });

    poller.stop();
    animator.stop();
    Ok(())
}
