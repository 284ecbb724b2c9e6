/// OpenAPI documentation generation.
pub mod documentation;
/// Idle game eviction.
pub mod expiry;
/// Buzzer game operations.
pub mod game_service;
/// Health check service.
pub mod health_service;
/// Write-behind persistence and startup restore.
pub mod persistence;
/// Read-only status projection.
pub mod public_service;
/// Server-Sent Events message generation.
pub mod sse_events;
/// Server-Sent Events streaming service.
pub mod sse_service;
/// Storage connection supervisor with reconnect backoff.
pub mod storage_supervisor;
