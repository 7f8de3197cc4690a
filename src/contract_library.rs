// Built-in contract interface descriptions

use alloy_json_abi::JsonAbi;

use crate::error::SoltestError;

/// Contract interface library
///
/// Holds the ABI of the authorized-wallet contract exercised by the
/// scenario. Bytecode is not shipped; it comes from the compiler output.
pub struct ContractLibrary;

impl ContractLibrary {
    /// Raw ABI JSON of the authorized-wallet contract
    ///
    /// Payable constructor, `Received`/`Sent` events and the methods:
    /// - owner: contract owner address
    /// - addAddress / removeAddress: manage the authorization list
    /// - getAuthorizedAddresses: current authorization list
    /// - checkFunds: contract balance in wei
    /// - nonce: replay counter for signed transfers
    /// - sendFunds: owner transfer out of the contract
    /// - sendFundsWithSignature: transfer authorized by an owner signature
    pub fn authorized_wallet_abi() -> &'static str {
        include_str!("abi/authorized_wallet.json")
    }

    /// Parsed form of [`Self::authorized_wallet_abi`]
    pub fn authorized_wallet() -> Result<JsonAbi, SoltestError> {
        serde_json::from_str(Self::authorized_wallet_abi())
            .map_err(|e| SoltestError::InvalidArtifact(format!("Built-in ABI: {}", e)))
    }
}
