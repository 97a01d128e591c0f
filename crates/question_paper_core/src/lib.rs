pub mod assembler;
pub mod catalogue;
pub mod domain;
pub mod identity;
pub mod library;
pub mod ports;

#[cfg(any(test, feature = "test-util"))]
pub mod memory;

pub use assembler::PaperAssembler;
pub use catalogue::Catalogue;
pub use domain::{
    AuthTokens, DownloadLink, GeneratedPaper, GenerationRequest, Paper, StorageLayout, Subject,
    TokenClaims, Topic, TopicSelection,
};
pub use identity::{TokenRejection, TokenVerifier};
pub use library::PaperLibrary;
pub use ports::{
    CredentialExchange, DocumentCombiner, DownloadLinkIssuer, ObjectStore, PaperRegistry,
    PortError, PortResult, SigningKeySource,
};
