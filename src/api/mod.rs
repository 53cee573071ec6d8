//! HTTP API Handlers and Routes
//!
//! This module provides the REST API layer for Courier, built on the Axum web framework.
//!
//! # Module Structure
//!
//! - [`api::handlers`](crate::api::handlers) - Request handlers for each endpoint
//! - [`api::routes`](crate::api::routes) - Route definitions and router configuration
//!
//! # API Endpoints
//!
//! ## Chat (`/api/chat`)
//! - `POST /api/chat` - Relay a message to the webhook and return its reply
//!
//! ## Conversations (`/api/conversation`)
//! - `GET /api/conversation/{sessionId}` - Get a session's history and preferences
//! - `DELETE /api/conversation/{sessionId}` - Clear a session
//! - `GET /api/conversations` - List sessions holding context
//!
//! ## Health (`/api/health`)
//! - `GET /api/health` - Health check endpoint
//!
//! Everything outside `/api` is served from the static UI directory.

/// Request and response handlers for all API endpoints.
pub mod handlers;
/// Router configuration and route definitions.
pub mod routes;
