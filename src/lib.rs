// Device records and typed patches
pub mod device;

// Bus message envelope and decoding
pub mod event;

// Device registry and event synchronizer
pub mod state;

// Named-channel subscription and dispatch
pub mod bus;

// Registry population
pub mod bootstrap;

// Read-only dashboard views
pub mod dashboard;

// Configuration
pub mod config;
