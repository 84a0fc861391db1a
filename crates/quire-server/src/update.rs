//! The update protocol.
//!
//! 1. `GET /update` issues a challenge: eight little-endian bytes.
//! 2. The publisher derives a key from the challenge and the shared secret,
//!    seals a signed record, and `POST`s the JSON envelope.
//! 3. The server consumes the challenge, opens the envelope, verifies the
//!    content hash, and stores the record.
//!
//! Update bodies larger than [`ServerContext::update_limit`] are rejected
//! after the challenge is consumed.
//!
//! Every failure in step 3 before the store write is reported as
//! [`ServerError::NotAuthorized`] or [`ServerError::NoChallenge`]; both map
//! to the same response so a rejected publisher learns nothing about why.

use std::net::SocketAddr;

use quire_core::{envelope, CoreError, Envelope};
use quire_store::Table;

use crate::challenge::Challenge;
use crate::context::ServerContext;
use crate::error::{Result, ServerError};

/// Issue a challenge for `client` and return its wire form.
pub fn issue_challenge<T: Table>(ctx: &ServerContext<T>, client: Option<SocketAddr>) -> [u8; 8] {
    ctx.issuer().issue(client).to_le_bytes()
}

/// Validate and apply one update body. Returns the stored record's name.
///
/// The outstanding challenge is consumed whatever the outcome.
pub fn handle_update<T: Table>(
    ctx: &ServerContext<T>,
    client: Option<SocketAddr>,
    body: &[u8],
) -> Result<String> {
    let challenge = take_challenge(ctx, client)?;
    apply_update(ctx, challenge, body)
}

/// Consume the outstanding challenge on behalf of an update from `client`.
///
/// This is the first step of every update attempt, before any of the body
/// is looked at.
pub fn take_challenge<T: Table>(
    ctx: &ServerContext<T>,
    client: Option<SocketAddr>,
) -> Result<Challenge> {
    let challenge = ctx.issuer().consume().map_err(|e| {
        tracing::warn!(client = ?client, "update without a challenge");
        e
    })?;

    if let (Some(issued_to), Some(client)) = (challenge.client, client) {
        if issued_to.ip() != client.ip() {
            tracing::warn!(%issued_to, %client, "update from a different address than the challenge");
        }
    }

    Ok(challenge)
}

/// Open `body` against an already consumed `challenge` and store the record.
pub fn apply_update<T: Table>(
    ctx: &ServerContext<T>,
    challenge: Challenge,
    body: &[u8],
) -> Result<String> {
    if body.len() > ctx.update_limit() {
        tracing::warn!(len = body.len(), limit = ctx.update_limit(), "update body too large");
        return Err(ServerError::NotAuthorized);
    }

    let envelope = Envelope::from_json(body).map_err(reject)?;
    let signed = envelope::decode(&envelope, challenge.value, ctx.secret()).map_err(reject)?;

    let name = signed.name;
    ctx.store().add(&name, signed.record)?;

    tracing::info!(name = %name, "update accepted");
    Ok(name)
}

fn reject(e: CoreError) -> ServerError {
    tracing::warn!(error = %e, "update rejected");
    ServerError::NotAuthorized
}
