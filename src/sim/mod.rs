pub mod clock;
pub mod engine;
pub mod facade;
pub mod framework;
pub mod modules;
pub mod path;
pub mod ramp;
