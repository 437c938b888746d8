// Icon and tooltip rendering
pub mod render;

// Rendering surface abstraction
pub mod surface;

// Live entity tracking
pub mod tracker;

// Inbound event model and validation
pub mod event;

// Event routing and the tracker event loop
pub mod transport;

// Map viewer WebSocket protocol
pub mod subscription;

// HTTP and WebSocket APIs
pub mod api;

// Configuration
pub mod config;
