// ABOUTME: Library surface for the wake-on-LAN NAS backup orchestrator
// ABOUTME: The binary in main.rs wires configuration into these modules

pub mod backup;
pub mod config;
pub mod error;
pub mod notify;
pub mod remote;
pub mod wol;
