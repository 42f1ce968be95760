// Data shapes: the configuration file and the environment description steps pass along.
pub mod configuration;
pub mod environment;
