pub mod animator;
pub mod config;
pub mod error;
pub mod iracing;
pub mod overlay;
pub mod poller;
pub mod sim;
pub mod timer;

#[macro_use] extern crate log;
extern crate yaml_rust;

pub use animator::{ AnimatorHandle, CycleAnimator, Phase };
pub use error::{ AnimatorError, ConfigError, FetchError, PollError };
pub use iracing::{ DriverSnapshot, PollResult, Update };
pub use iracing::driver_api::{ DriverSource, HttpDriverSource, fetch_driver_data };
pub use overlay::{ Marker, Slot, StateUpdater, TextSlot };
pub use poller::{ ControlHandle, PollingController, get_driver_data, start_driver_polling };
