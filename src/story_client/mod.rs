//! Story Protocol client for IP registration and license issuance.
//!
//! This adapter is the boundary to the external IP collaborator. License
//! issuance after a verification is best-effort: callers catch failures,
//! log them, and report a null receipt rather than failing the operation.
//! Without a configured gateway the client runs in simulation mode and
//! returns synthetic receipts, which keeps development setups self-contained.

use crate::config::StoryConfig;
use crate::error::{AppError, AppResult};
use crate::scoring::ScoreSummary;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

/// Metadata describing a prompt being registered as an IP asset
#[derive(Debug, Clone, Serialize)]
pub struct IpMetadata {
    pub name: String,
    pub description: String,
    pub category: String,
    pub license_type: String,
    /// Reputation snapshot embedded in the on-chain metadata
    pub reputation: ReputationSnapshot,
}

/// Reputation figures recorded at registration time
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReputationSnapshot {
    pub trust_score: f64,
    pub effectiveness_score: f64,
    pub verification_count: i32,
    pub creator_reputation_points: i32,
}

impl ReputationSnapshot {
    pub fn new(scores: ScoreSummary, creator_reputation_points: i32) -> Self {
        Self {
            trust_score: scores.trust_score,
            effectiveness_score: scores.effectiveness_score,
            verification_count: scores.verification_count,
            creator_reputation_points,
        }
    }
}

/// Result of registering a prompt as an IP asset
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IpRegistration {
    pub ip_id: String,
    pub license_terms_id: String,
    pub tx_hash: String,
}

/// Receipt for a minted license token
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenseReceipt {
    pub license_token_id: String,
    pub tx_hash: String,
}

/// External IP collaborator interface consumed by the services
#[async_trait]
pub trait StoryGateway: Send + Sync {
    /// Register a prompt as an IP asset with attached license terms
    async fn register_ip(&self, metadata: IpMetadata) -> AppResult<IpRegistration>;

    /// Mint one license token for a verifier's wallet
    async fn issue_license(
        &self,
        ip_id: &str,
        license_terms_id: &str,
        receiver_wallet: &str,
    ) -> AppResult<LicenseReceipt>;
}

/// HTTP client for a Story Protocol gateway
pub struct StoryClient {
    config: StoryConfig,
    http: reqwest::Client,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MintLicenseRequest<'a> {
    ip_id: &'a str,
    license_terms_id: &'a str,
    receiver: &'a str,
    amount: u32,
}

impl StoryClient {
    /// Create a client from configuration
    pub fn with_config(config: StoryConfig) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;

        if config.gateway_url.is_none() {
            info!("Story gateway not configured, running in simulation mode");
        }

        Ok(Self { config, http })
    }

    fn simulated_tx_hash() -> String {
        format!("0xsim{}", Uuid::new_v4().simple())
    }
}

#[async_trait]
impl StoryGateway for StoryClient {
    async fn register_ip(&self, metadata: IpMetadata) -> AppResult<IpRegistration> {
        let Some(base) = self.config.gateway_url.as_deref() else {
            let registration = IpRegistration {
                ip_id: format!("sim-ip-{}", Uuid::new_v4()),
                license_terms_id: format!("sim-terms-{}", Uuid::new_v4().simple()),
                tx_hash: Self::simulated_tx_hash(),
            };
            debug!(ip_id = %registration.ip_id, "Simulated IP registration");
            return Ok(registration);
        };

        let response = self
            .http
            .post(format!("{}/ip-assets", base))
            .json(&metadata)
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("IP registration failed: {}", e)))?
            .error_for_status()
            .map_err(|e| AppError::ExternalService(format!("IP registration rejected: {}", e)))?;

        let registration: IpRegistration = response
            .json()
            .await
            .map_err(|e| AppError::ExternalService(format!("Invalid registration response: {}", e)))?;

        info!(ip_id = %registration.ip_id, tx = %registration.tx_hash, "Registered IP asset");
        Ok(registration)
    }

    async fn issue_license(
        &self,
        ip_id: &str,
        license_terms_id: &str,
        receiver_wallet: &str,
    ) -> AppResult<LicenseReceipt> {
        let Some(base) = self.config.gateway_url.as_deref() else {
            let receipt = LicenseReceipt {
                license_token_id: format!("sim-license-{}", Uuid::new_v4().simple()),
                tx_hash: Self::simulated_tx_hash(),
            };
            debug!(ip_id, "Simulated license mint");
            return Ok(receipt);
        };

        let request = MintLicenseRequest {
            ip_id,
            license_terms_id,
            receiver: receiver_wallet,
            amount: 1,
        };

        let response = self
            .http
            .post(format!("{}/licenses/mint", base))
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("License mint failed: {}", e)))?
            .error_for_status()
            .map_err(|e| AppError::ExternalService(format!("License mint rejected: {}", e)))?;

        let receipt: LicenseReceipt = response
            .json()
            .await
            .map_err(|e| AppError::ExternalService(format!("Invalid license response: {}", e)))?;

        info!(ip_id, tx = %receipt.tx_hash, "Minted verification license");
        Ok(receipt)
    }
}
