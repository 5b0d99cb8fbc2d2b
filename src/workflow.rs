// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Prompt Marketplace Contributors

//! Client-side workflow controllers.
//!
//! Each user-initiated action runs as a small finite state machine over
//! external collaborators. Steps are strictly sequential within one flow:
//! metadata must be pinned before a mint is attempted, and a payment must
//! be acknowledged before the confirmation wait begins.
//!
//! Failures surface the step error and return the controller to `Idle`.
//! A flow that failed mid-way never exposes partial output: an upload
//! whose mint failed is not presented as a usable asset.

use std::future::Future;

use serde_json::Value;
use thiserror::Error;

use crate::content::StoredContent;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("A submission for this target is already in flight")]
    AlreadyInFlight,

    #[error("{stage} failed: {message}")]
    Step { stage: &'static str, message: String },
}

impl WorkflowError {
    fn step(stage: &'static str, message: impl Into<String>) -> Self {
        WorkflowError::Step {
            stage,
            message: message.into(),
        }
    }
}

/// Receipt from a completed mint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintReceipt {
    pub token_ref: String,
}

/// Reference to a submitted payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRef {
    pub transaction_hash: String,
}

/// Pins prompt metadata to content storage.
pub trait MetadataUploader {
    fn upload(
        &self,
        metadata: &Value,
    ) -> impl Future<Output = Result<StoredContent, String>> + Send;
}

/// Mints a token for pinned metadata.
pub trait Minter {
    fn mint(&self, content_hash: &str) -> impl Future<Output = Result<MintReceipt, String>> + Send;
}

/// Submits and confirms a listing payment.
pub trait PaymentGateway {
    fn submit_payment(
        &self,
        listing_id: &str,
    ) -> impl Future<Output = Result<PaymentRef, String>> + Send;

    fn await_confirmation(
        &self,
        payment: &PaymentRef,
    ) -> impl Future<Output = Result<(), String>> + Send;
}

/// A fully created asset: pinned metadata plus its mint receipt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintedAsset {
    pub content: StoredContent,
    pub receipt: MintReceipt,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateState {
    Idle,
    Uploading,
    Minting,
    Confirmed(MintedAsset),
}

impl CreateState {
    fn in_flight(&self) -> bool {
        matches!(self, CreateState::Uploading | CreateState::Minting)
    }
}

/// Create-asset flow: `Idle -> Uploading -> Minting -> Confirmed`.
pub struct CreateFlow<U, M> {
    uploader: U,
    minter: M,
    state: CreateState,
    last_error: Option<WorkflowError>,
}

impl<U: MetadataUploader, M: Minter> CreateFlow<U, M> {
    pub fn new(uploader: U, minter: M) -> Self {
        Self {
            uploader,
            minter,
            state: CreateState::Idle,
            last_error: None,
        }
    }

    pub fn state(&self) -> &CreateState {
        &self.state
    }

    /// The error surfaced by the most recent failed run.
    pub fn last_error(&self) -> Option<&WorkflowError> {
        self.last_error.as_ref()
    }

    fn fail(&mut self, err: WorkflowError) -> WorkflowError {
        self.state = CreateState::Idle;
        self.last_error = Some(err.clone());
        err
    }

    /// Drive the flow to completion for one metadata document.
    pub async fn run(&mut self, metadata: &Value) -> Result<MintedAsset, WorkflowError> {
        if self.state.in_flight() {
            return Err(WorkflowError::AlreadyInFlight);
        }
        self.last_error = None;

        self.state = CreateState::Uploading;
        let content = match self.uploader.upload(metadata).await {
            Ok(content) => content,
            Err(message) => return Err(self.fail(WorkflowError::step("Upload", message))),
        };

        self.state = CreateState::Minting;
        let receipt = match self.minter.mint(&content.hash).await {
            Ok(receipt) => receipt,
            Err(message) => return Err(self.fail(WorkflowError::step("Mint", message))),
        };

        let asset = MintedAsset { content, receipt };
        self.state = CreateState::Confirmed(asset.clone());
        Ok(asset)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurchaseState {
    Idle,
    Submitting,
    AwaitingConfirmation,
    Confirmed(PaymentRef),
}

impl PurchaseState {
    fn in_flight(&self) -> bool {
        matches!(
            self,
            PurchaseState::Submitting | PurchaseState::AwaitingConfirmation
        )
    }
}

/// Purchase flow: `Idle -> Submitting -> AwaitingConfirmation -> Confirmed`.
///
/// While a submission for a target is in flight, further submissions are
/// rejected with [`WorkflowError::AlreadyInFlight`] (no double-buy-click).
pub struct PurchaseFlow<G> {
    gateway: G,
    state: PurchaseState,
    target: Option<String>,
    last_error: Option<WorkflowError>,
}

impl<G: PaymentGateway> PurchaseFlow<G> {
    pub fn new(gateway: G) -> Self {
        Self {
            gateway,
            state: PurchaseState::Idle,
            target: None,
            last_error: None,
        }
    }

    pub fn state(&self) -> &PurchaseState {
        &self.state
    }

    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    pub fn last_error(&self) -> Option<&WorkflowError> {
        self.last_error.as_ref()
    }

    /// Enter `Submitting` for a target. Fails while a prior submission
    /// has not reached a terminal state.
    pub fn begin(&mut self, listing_id: &str) -> Result<(), WorkflowError> {
        if self.state.in_flight() {
            return Err(WorkflowError::AlreadyInFlight);
        }
        self.last_error = None;
        self.target = Some(listing_id.to_string());
        self.state = PurchaseState::Submitting;
        Ok(())
    }

    fn fail(&mut self, err: WorkflowError) -> WorkflowError {
        self.state = PurchaseState::Idle;
        self.last_error = Some(err.clone());
        err
    }

    /// Drive the flow to completion for one listing.
    pub async fn run(&mut self, listing_id: &str) -> Result<PaymentRef, WorkflowError> {
        self.begin(listing_id)?;

        let payment = match self.gateway.submit_payment(listing_id).await {
            Ok(payment) => payment,
            Err(message) => return Err(self.fail(WorkflowError::step("Payment", message))),
        };

        self.state = PurchaseState::AwaitingConfirmation;
        if let Err(message) = self.gateway.await_confirmation(&payment).await {
            return Err(self.fail(WorkflowError::step("Confirmation", message)));
        }

        self.state = PurchaseState::Confirmed(payment.clone());
        Ok(payment)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use serde_json::json;

    struct FakeUploader {
        fail: bool,
        calls: AtomicUsize,
    }

    impl FakeUploader {
        fn new(fail: bool) -> Self {
            Self {
                fail,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl MetadataUploader for FakeUploader {
        async fn upload(&self, _metadata: &Value) -> Result<StoredContent, String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err("gateway unreachable".to_string())
            } else {
                Ok(StoredContent {
                    hash: "abc123".to_string(),
                    url: "https://ipfs.io/ipfs/abc123".to_string(),
                })
            }
        }
    }

    struct FakeMinter {
        fail: bool,
        calls: AtomicUsize,
    }

    impl FakeMinter {
        fn new(fail: bool) -> Self {
            Self {
                fail,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl Minter for FakeMinter {
        async fn mint(&self, content_hash: &str) -> Result<MintReceipt, String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err("mint reverted".to_string())
            } else {
                Ok(MintReceipt {
                    token_ref: format!("token:{content_hash}"),
                })
            }
        }
    }

    struct FakeGateway {
        fail_submit: bool,
        fail_confirm: bool,
    }

    impl PaymentGateway for FakeGateway {
        async fn submit_payment(&self, listing_id: &str) -> Result<PaymentRef, String> {
            if self.fail_submit {
                Err("rejected by wallet".to_string())
            } else {
                Ok(PaymentRef {
                    transaction_hash: format!("0x{listing_id}"),
                })
            }
        }

        async fn await_confirmation(&self, _payment: &PaymentRef) -> Result<(), String> {
            if self.fail_confirm {
                Err("confirmation timed out".to_string())
            } else {
                Ok(())
            }
        }
    }

    #[tokio::test]
    async fn create_flow_happy_path() {
        let mut flow = CreateFlow::new(FakeUploader::new(false), FakeMinter::new(false));
        assert_eq!(flow.state(), &CreateState::Idle);

        let asset = flow.run(&json!({"title": "T"})).await.unwrap();
        assert_eq!(asset.content.hash, "abc123");
        assert_eq!(asset.receipt.token_ref, "token:abc123");
        assert_eq!(flow.state(), &CreateState::Confirmed(asset));
        assert!(flow.last_error().is_none());
    }

    #[tokio::test]
    async fn create_flow_upload_failure_returns_to_idle() {
        let mut flow = CreateFlow::new(FakeUploader::new(true), FakeMinter::new(false));

        let err = flow.run(&json!({})).await.unwrap_err();
        assert_eq!(
            err,
            WorkflowError::step("Upload", "gateway unreachable")
        );
        assert_eq!(flow.state(), &CreateState::Idle);
        assert_eq!(flow.last_error(), Some(&err));
        // The mint step was never reached.
        assert_eq!(flow.minter.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn create_flow_mint_failure_exposes_no_partial_asset() {
        let mut flow = CreateFlow::new(FakeUploader::new(false), FakeMinter::new(true));

        let err = flow.run(&json!({})).await.unwrap_err();
        assert_eq!(err, WorkflowError::step("Mint", "mint reverted"));
        // The upload succeeded, but no asset is observable.
        assert_eq!(flow.uploader.calls.load(Ordering::SeqCst), 1);
        assert_eq!(flow.state(), &CreateState::Idle);
    }

    #[tokio::test]
    async fn create_flow_recovers_after_failure() {
        let mut flow = CreateFlow::new(FakeUploader::new(false), FakeMinter::new(true));
        flow.run(&json!({})).await.unwrap_err();

        flow.minter.fail = false;
        let asset = flow.run(&json!({})).await.unwrap();
        assert_eq!(flow.state(), &CreateState::Confirmed(asset));
        assert!(flow.last_error().is_none());
    }

    #[tokio::test]
    async fn purchase_flow_happy_path() {
        let mut flow = PurchaseFlow::new(FakeGateway {
            fail_submit: false,
            fail_confirm: false,
        });

        let payment = flow.run("listing-1").await.unwrap();
        assert_eq!(payment.transaction_hash, "0xlisting-1");
        assert_eq!(flow.state(), &PurchaseState::Confirmed(payment));
        assert_eq!(flow.target(), Some("listing-1"));
    }

    #[tokio::test]
    async fn purchase_flow_rejects_duplicate_submission() {
        let mut flow = PurchaseFlow::new(FakeGateway {
            fail_submit: false,
            fail_confirm: false,
        });

        flow.begin("listing-1").unwrap();
        assert_eq!(flow.state(), &PurchaseState::Submitting);

        // Second click while the first submission is in flight.
        assert_eq!(
            flow.begin("listing-1").unwrap_err(),
            WorkflowError::AlreadyInFlight
        );
    }

    #[tokio::test]
    async fn purchase_flow_submit_rejection() {
        let mut flow = PurchaseFlow::new(FakeGateway {
            fail_submit: true,
            fail_confirm: false,
        });

        let err = flow.run("listing-1").await.unwrap_err();
        assert_eq!(err, WorkflowError::step("Payment", "rejected by wallet"));
        assert_eq!(flow.state(), &PurchaseState::Idle);
        // Back at Idle, a fresh submission is allowed again.
        assert!(flow.begin("listing-1").is_ok());
    }

    #[tokio::test]
    async fn purchase_flow_confirmation_timeout() {
        let mut flow = PurchaseFlow::new(FakeGateway {
            fail_submit: false,
            fail_confirm: true,
        });

        let err = flow.run("listing-1").await.unwrap_err();
        assert_eq!(
            err,
            WorkflowError::step("Confirmation", "confirmation timed out")
        );
        assert_eq!(flow.state(), &PurchaseState::Idle);
        assert_eq!(flow.last_error(), Some(&err));
    }

    #[tokio::test]
    async fn purchase_flow_allows_new_target_after_confirmation() {
        let mut flow = PurchaseFlow::new(FakeGateway {
            fail_submit: false,
            fail_confirm: false,
        });

        flow.run("listing-1").await.unwrap();
        let payment = flow.run("listing-2").await.unwrap();
        assert_eq!(payment.transaction_hash, "0xlisting-2");
        assert_eq!(flow.target(), Some("listing-2"));
    }
}
