//! # Quire Server
//!
//! HTTP front end for a [`ContentStore`](quire_store::ContentStore) that
//! accepts new records only from a holder of the shared update secret.
//!
//! ## Protocol
//!
//! A publisher fetches a one-time challenge with `GET /update`, derives a
//! key from it and the secret, and posts an encrypted, hashed record to
//! `POST /update`. The challenge is spent by that post whether it succeeds or
//! not. See [`update`] for details.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use quire_server::{routes, ServerContext, ServerConfig};
//! use clap::Parser;
//!
//! # async fn run() -> quire_server::Result<()> {
//! let config = ServerConfig::parse();
//! let ctx = Arc::new(ServerContext::open(&config)?);
//! let listener = tokio::net::TcpListener::bind(config.addr).await?;
//! routes::serve(listener, ctx, std::future::pending()).await?;
//! # Ok(())
//! # }
//! ```
//!
//! Publishing from code:
//!
//! ```rust,no_run
//! use chrono::Utc;
//! use quire_core::ContentRecord;
//! use quire_server::Publisher;
//!
//! # async fn run() -> quire_server::Result<()> {
//! let publisher = Publisher::new("http://localhost:8080", b"secret".to_vec())?;
//! let record = ContentRecord::new("Hello", Utc::now(), "<p>hi</p>");
//! publisher.publish("hello", &record).await?;
//! # Ok(())
//! # }
//! ```

pub mod challenge;
pub mod config;
pub mod context;
pub mod error;
pub mod publisher;
pub mod routes;
pub mod telemetry;
pub mod update;

pub use challenge::{Challenge, ChallengeIssuer};
pub use config::{load_secret, PublishConfig, ServerConfig};
pub use context::ServerContext;
pub use error::{Result, ServerError};
pub use publisher::Publisher;
