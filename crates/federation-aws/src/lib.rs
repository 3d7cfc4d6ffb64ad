// crates/federation-aws/src/lib.rs
// ============================================================================
// Module: Federation AWS Clients
// Description: Token-service and sign-in endpoint clients.
// Purpose: Implement the upstream interfaces consumed by the federation broker.
// Dependencies: aws-sdk-sts, reqwest, federation-core
// ============================================================================

//! ## Overview
//! [`StsTokenService`] implements role assumption through AWS STS and
//! [`HttpSigninTokenService`] implements the console sign-in token exchange.
//! Both report failures as [`federation_core::TokenServiceError`] with the
//! upstream status when one was received.

pub mod signin;
pub mod sts;

pub use signin::DEFAULT_SIGNIN_ENDPOINT;
pub use signin::HttpSigninTokenService;
pub use signin::SigninClientError;
pub use sts::StsSettings;
pub use sts::StsTokenService;
