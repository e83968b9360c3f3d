/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Player directory operations.
pub mod player_service;
/// Finalized results listing and removal.
pub mod score_service;
/// Scoring session lifecycle and actions.
pub mod session_service;
/// Server-Sent Events message generation.
pub mod sse_events;
/// Server-Sent Events broadcasting service.
pub mod sse_service;
