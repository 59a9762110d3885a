// ─── CatClient Core ───
// Launch pipeline for a Minecraft client.
//
// Architecture:
//   core/
//     config/  : Launcher paths, endpoints and the persisted settings store
//     version/ : Mojang manifest + in-memory version catalog
//     auth/    : Third-party account authentication and session state
//     java/    : Java runtime download, unpacking and discovery
//     launch/  : Launch plan, process spawner and orchestrator
//     state/   : Wiring of all components

pub mod auth;
pub mod config;
pub mod error;
pub mod http;
pub mod java;
pub mod launch;
pub mod state;
pub mod version;
