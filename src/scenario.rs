//! The end-to-end exercise against a running node
//!
//! connect -> accounts -> load artifact -> deploy -> owner()
//! -> addAddress(accounts[1]) -> getAuthorizedAddresses() -> checkFunds()
//! -> sendFunds(accounts[2], X ether) -> checkFunds()
//!
//! Steps run strictly in order and every transaction waits for its receipt.
//! The first failure aborts the run and is returned unchanged.
//!
//! `sendFunds` pays out of the wallet's own balance. When the ABI marks it
//! nonpayable the X ether are attached to the payable constructor instead,
//! so the transfer step moves ether that the contract actually holds.

use alloy_json_abi::StateMutability;
use alloy_primitives::utils::format_ether;
use alloy_primitives::{Address, B256, U256};
use std::fmt;

use crate::artifact::ContractArtifact;
use crate::config::{ArtifactSource, SoltestConfig};
use crate::contract::{Contract, TxOptions};
use crate::error::SoltestError;
use crate::rpc::EthRpcClient;
use crate::wallet::AuthorizedWallet;

/// Deployer, authorized address and transfer recipient
pub const REQUIRED_ACCOUNTS: usize = 3;

/// Contract methods the sequence calls
pub const REQUIRED_METHODS: [&str; 5] = [
    "owner",
    "addAddress",
    "getAuthorizedAddresses",
    "checkFunds",
    "sendFunds",
];

/// How the transferred ether reaches the wallet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Funding {
    /// Attached to the `sendFunds` transaction itself
    WithTransfer,
    /// Attached to the deployment, `sendFunds` carries no value
    AtDeployment,
}

impl Funding {
    /// Pick the funding path the artifact's ABI allows
    pub fn for_artifact(artifact: &ContractArtifact) -> Self {
        let payable = artifact.abi.function("sendFunds").map_or(false, |overloads| {
            overloads
                .iter()
                .any(|f| f.inputs.len() == 2 && f.state_mutability == StateMutability::Payable)
        });
        if payable {
            Self::WithTransfer
        } else {
            Self::AtDeployment
        }
    }
}

/// What the run observed
#[derive(Debug, Clone)]
pub struct ScenarioReport {
    pub client_version: String,
    pub chain_id: u64,
    pub deployer: Address,
    pub contract_address: Address,
    pub deploy_tx: B256,
    pub funding: Funding,
    pub owner: Address,
    pub authorized_addresses: Vec<Address>,
    pub balance_before: U256,
    pub transfer_amount: U256,
    pub recipient: Address,
    pub recipient_balance_before: U256,
    pub recipient_balance_after: U256,
    pub balance_after: U256,
}

impl ScenarioReport {
    pub fn owner_is_deployer(&self) -> bool {
        self.owner == self.deployer
    }

    /// Net change of the recipient's node balance in wei
    pub fn recipient_delta(&self) -> U256 {
        self.recipient_balance_after
            .saturating_sub(self.recipient_balance_before)
    }
}

impl fmt::Display for ScenarioReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let authorized: Vec<String> = self
            .authorized_addresses
            .iter()
            .map(ToString::to_string)
            .collect();

        writeln!(f, "Node: {} (chain id {})", self.client_version, self.chain_id)?;
        writeln!(f, "Contract address: {}", self.contract_address)?;
        if self.funding == Funding::AtDeployment {
            writeln!(
                f,
                "Funded at deployment: {} ETH",
                format_ether(self.transfer_amount)
            )?;
        }
        writeln!(f, "Contract owner: {}", self.owner)?;
        writeln!(f, "Authorized addresses: [{}]", authorized.join(", "))?;
        writeln!(f, "Contract balance: {}", self.balance_before)?;
        writeln!(
            f,
            "Sent {} ETH to {} (recipient balance +{} wei)",
            format_ether(self.transfer_amount),
            self.recipient,
            self.recipient_delta()
        )?;
        write!(f, "Contract balance after sending: {}", self.balance_after)
    }
}

/// A client whose node answered `web3_clientVersion`
#[derive(Debug, Clone)]
pub struct Connection {
    pub client: EthRpcClient,
    pub client_version: String,
}

/// Open a client and make sure the node answers
pub async fn connect(rpc_url: &str) -> Result<Connection, SoltestError> {
    let client = EthRpcClient::new(rpc_url);
    let client_version = client.client_version().await.map_err(|e| {
        log::debug!("web3_clientVersion failed: {}", e);
        SoltestError::connection_failed("Unable to connect to Ethereum node")
    })?;
    log::info!("🔗 Connected to {} ({})", rpc_url, client_version);
    Ok(Connection {
        client,
        client_version,
    })
}

/// Unlocked accounts, failing when the sequence can't be staffed
pub async fn scenario_accounts(client: &EthRpcClient) -> Result<Vec<Address>, SoltestError> {
    let accounts = client.accounts().await?;
    if accounts.len() < REQUIRED_ACCOUNTS {
        return Err(SoltestError::MissingAccounts {
            required: REQUIRED_ACCOUNTS,
            found: accounts.len(),
        });
    }
    log::info!("👤 Default account: {}", accounts[0]);
    Ok(accounts)
}

/// Resolve the configured artifact source
pub fn load_artifact(config: &SoltestConfig) -> Result<ContractArtifact, SoltestError> {
    let artifact = match &config.artifact {
        Some(ArtifactSource::File(path)) => ContractArtifact::from_file(path)?,
        Some(ArtifactSource::Bytecode(code)) => ContractArtifact::authorized_wallet(code)?,
        None => {
            return Err(SoltestError::Config(
                "Set SOLTEST_ARTIFACT or SOLTEST_BYTECODE to the compiled contract".to_string(),
            ))
        }
    };

    if let Some(missing) = REQUIRED_METHODS
        .iter()
        .find(|name| !artifact.has_function(name))
    {
        return Err(SoltestError::InvalidArtifact(format!(
            "Contract has no {} function",
            missing
        )));
    }
    Ok(artifact)
}

/// Run the whole sequence using `config`
pub async fn run(config: &SoltestConfig) -> Result<ScenarioReport, SoltestError> {
    let transfer_amount = config.transfer_amount()?;
    let connection = connect(&config.rpc_url).await?;
    let accounts = scenario_accounts(&connection.client).await?;
    let artifact = load_artifact(config)?;
    exercise(&connection, &artifact, &accounts, transfer_amount, config).await
}

/// Run the sequence with an already connected client and loaded artifact
pub async fn run_with(
    connection: &Connection,
    artifact: &ContractArtifact,
    config: &SoltestConfig,
) -> Result<ScenarioReport, SoltestError> {
    let transfer_amount = config.transfer_amount()?;
    let accounts = scenario_accounts(&connection.client).await?;
    exercise(connection, artifact, &accounts, transfer_amount, config).await
}

async fn exercise(
    connection: &Connection,
    artifact: &ContractArtifact,
    accounts: &[Address],
    transfer_amount: U256,
    config: &SoltestConfig,
) -> Result<ScenarioReport, SoltestError> {
    let client = &connection.client;
    let chain_id = client.chain_id().await?;
    log::info!("   Node {} on chain {}", connection.client_version, chain_id);

    let deployer = accounts[0];
    let authorized = accounts[1];
    let recipient = accounts[2];

    let funding = Funding::for_artifact(artifact);
    let (deploy_value, transfer_value) = match funding {
        Funding::WithTransfer => (U256::ZERO, transfer_amount),
        Funding::AtDeployment => {
            log::info!(
                "💰 sendFunds is not payable, funding the wallet with {} ETH at deployment",
                format_ether(transfer_amount)
            );
            (transfer_amount, U256::ZERO)
        }
    };

    let (contract, deploy_receipt) = Contract::deploy(
        client,
        artifact,
        &[],
        TxOptions::sender(deployer).with_value(deploy_value),
        config.receipt_wait,
    )
    .await?;
    let wallet = AuthorizedWallet::new(contract);

    let owner = wallet.owner().await?;
    log::info!("🔑 Contract owner: {}", owner);
    if owner != deployer {
        log::warn!("⚠️  Owner {} differs from deployer {}", owner, deployer);
    }

    wallet.add_address(authorized).await?;
    let authorized_addresses = wallet.authorized_addresses().await?;
    log::info!("📋 Authorized addresses: {:?}", authorized_addresses);
    if !authorized_addresses.contains(&authorized) {
        log::warn!("⚠️  {} missing from authorization list", authorized);
    }

    let balance_before = wallet.check_funds().await?;
    log::info!("💰 Contract balance: {}", balance_before);

    let recipient_balance_before = client.get_balance(recipient).await?;
    wallet
        .send_funds(recipient, transfer_amount, transfer_value)
        .await?;
    let recipient_balance_after = client.get_balance(recipient).await?;
    log::info!(
        "💸 Sent {} ETH to {}",
        format_ether(transfer_amount),
        recipient
    );

    let balance_after = wallet.check_funds().await?;
    log::info!("💰 Contract balance after sending: {}", balance_after);

    Ok(ScenarioReport {
        client_version: connection.client_version.clone(),
        chain_id,
        deployer,
        contract_address: wallet.address(),
        deploy_tx: deploy_receipt.transaction_hash,
        funding,
        owner,
        authorized_addresses,
        balance_before,
        transfer_amount,
        recipient,
        recipient_balance_before,
        recipient_balance_after,
        balance_after,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const ONE_ETHER: u128 = 1_000_000_000_000_000_000;

    fn report() -> ScenarioReport {
        ScenarioReport {
            client_version: "Ganache/v7.9.1/EthereumJS TestRPC/v7.9.1/ethereum-js".to_string(),
            chain_id: 1337,
            deployer: Address::repeat_byte(0x01),
            contract_address: Address::repeat_byte(0xcc),
            deploy_tx: B256::repeat_byte(0xdd),
            funding: Funding::AtDeployment,
            owner: Address::repeat_byte(0x01),
            authorized_addresses: vec![Address::repeat_byte(0x02)],
            balance_before: U256::from(ONE_ETHER),
            transfer_amount: U256::from(ONE_ETHER),
            recipient: Address::repeat_byte(0x03),
            recipient_balance_before: U256::from(5u64),
            recipient_balance_after: U256::from(ONE_ETHER + 5),
            balance_after: U256::ZERO,
        }
    }

    #[test]
    fn test_report_lines() {
        let text = report().to_string();
        assert!(text.contains("Contract owner: 0x0101010101010101010101010101010101010101"));
        assert!(text.contains("Funded at deployment: 1"));
        assert!(text.contains("Contract balance: 1000000000000000000"));
        assert!(text.contains("ETH to 0x0303030303030303030303030303030303030303"));
        assert!(text.ends_with("Contract balance after sending: 0"));
    }

    #[test]
    fn test_report_derived_values() {
        let report = report();
        assert!(report.owner_is_deployer());
        assert_eq!(report.recipient_delta(), report.transfer_amount);
    }

    #[test]
    fn test_load_artifact_requires_source() {
        let err = load_artifact(&SoltestConfig::default()).unwrap_err();
        assert!(matches!(err, SoltestError::Config(_)));
    }

    #[test]
    fn test_built_in_wallet_is_funded_at_deployment() {
        let artifact = ContractArtifact::authorized_wallet("0x00").unwrap();
        assert_eq!(Funding::for_artifact(&artifact), Funding::AtDeployment);
    }

    #[test]
    fn test_payable_send_funds_is_funded_with_transfer() {
        let abi = r#"[{"type":"function","name":"sendFunds","stateMutability":"payable",
            "inputs":[{"name":"to","type":"address"},{"name":"amount","type":"uint256"}],
            "outputs":[]}]"#;
        let artifact = ContractArtifact::from_parts(abi, "0x00").unwrap();
        assert_eq!(Funding::for_artifact(&artifact), Funding::WithTransfer);
    }

    #[test]
    fn test_load_artifact_requires_scenario_methods() {
        let abi = r#"[{"type":"function","name":"owner","stateMutability":"view",
            "inputs":[],"outputs":[{"name":"","type":"address"}]}]"#;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Owned.json");
        std::fs::write(&path, format!(r#"{{"abi": {}, "bytecode": "0x00"}}"#, abi)).unwrap();

        let config = SoltestConfig {
            artifact: Some(ArtifactSource::File(path)),
            ..SoltestConfig::default()
        };
        let err = load_artifact(&config).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid contract artifact: Contract has no addAddress function"
        );
    }

    #[tokio::test]
    async fn test_connect_refused() {
        // Port 9 (discard) is not an Ethereum node
        let err = connect("http://127.0.0.1:9").await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Failed to connect to Ethereum node: Unable to connect to Ethereum node"
        );
    }
}
