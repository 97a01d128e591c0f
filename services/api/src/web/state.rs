//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use question_paper_core::{Catalogue, CredentialExchange, PaperAssembler, PaperLibrary, TokenVerifier};
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
///
/// Every external dependency sits behind a port, so tests can build the same
/// state from in-memory adapters.
#[derive(Clone)]
pub struct AppState {
    pub credentials: Arc<dyn CredentialExchange>,
    pub verifier: Arc<TokenVerifier>,
    pub catalogue: Arc<Catalogue>,
    pub assembler: Arc<PaperAssembler>,
    pub library: Arc<PaperLibrary>,
}
