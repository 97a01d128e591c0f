pub mod cognito;
pub mod jwks;
pub mod pdf;
pub mod registry;
pub mod s3;

pub use cognito::CognitoAdapter;
pub use jwks::HttpJwksSource;
pub use pdf::LopdfCombiner;
pub use registry::PgPaperRegistry;
pub use s3::S3Adapter;
