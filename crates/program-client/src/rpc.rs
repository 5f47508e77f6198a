//! RPC Program Client - cluster access through `solana-client`
//!
//! Reads the link account with `getAccountInfo` and submits transactions with
//! `send_and_confirm_transaction`, which polls signature status until the
//! configured commitment is reached or the blockhash expires. A write only
//! returns once it is confirmed, so a fetch issued afterwards observes it.

use async_trait::async_trait;
use portal_interface::{constants::LINK_ACCOUNT_SPACE, instruction, LinkAccount};
use solana_client::{
    client_error::{ClientError, ClientErrorKind},
    nonblocking::rpc_client::RpcClient,
    rpc_request::RpcError,
};
use solana_sdk::{
    account::Account,
    hash::Hash,
    instruction::Instruction,
    message::Message,
    pubkey::Pubkey,
    signature::{Keypair, Signature},
    system_instruction,
    transaction::Transaction,
};
use std::sync::Arc;
use wallet_adapter::{Identity, WalletAdapter};

use crate::{
    client::{AccountSnapshot, FetchError, ProgramClient, WriteError},
    config::ProgramConfig,
};

/// Link account client talking to a cluster over HTTP JSON-RPC
pub struct RpcProgramClient {
    config: Arc<ProgramConfig>,
    wallet: Arc<dyn WalletAdapter>,
    rpc: RpcClient,
}

impl RpcProgramClient {
    /// Create a client; `wallet` signs every write.
    pub fn new(config: Arc<ProgramConfig>, wallet: Arc<dyn WalletAdapter>) -> Self {
        let rpc = RpcClient::new_with_timeout_and_commitment(
            config.rpc_url.clone(),
            config.request_timeout,
            config.commitment,
        );

        Self {
            config,
            wallet,
            rpc,
        }
    }

    /// Sign, send and confirm a transaction paid for by `identity`
    async fn submit(
        &self,
        identity: &Identity,
        instructions: &[Instruction],
        co_signer: Option<&Keypair>,
    ) -> Result<Signature, WriteError> {
        let blockhash = self.rpc.get_latest_blockhash().await.map_err(write_error)?;
        let mut transaction = build_transaction(&identity.pubkey(), instructions, blockhash, co_signer)?;

        self.wallet
            .sign_transaction(identity, &mut transaction)
            .await
            .map_err(|e| WriteError::Rejected(e.to_string()))?;

        let timeout = self.config.confirm_timeout;
        let signature = tokio::time::timeout(timeout, self.rpc.send_and_confirm_transaction(&transaction))
            .await
            .map_err(|_| {
                WriteError::Transport(format!(
                    "transaction {} not {:?} within {:?}",
                    transaction.signatures[0], self.config.commitment.commitment, timeout
                ))
            })?
            .map_err(write_error)?;

        tracing::debug!("Confirmed transaction {}", signature);
        Ok(signature)
    }
}

#[async_trait]
impl ProgramClient for RpcProgramClient {
    fn account_address(&self) -> Pubkey {
        self.config.account_address()
    }

    async fn fetch_account(&self) -> Result<AccountSnapshot, FetchError> {
        let address = self.account_address();
        let response = self
            .rpc
            .get_account_with_commitment(&address, self.config.commitment)
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let snapshot = decode_account(
            &address,
            &self.config.program_id,
            response.context.slot,
            response.value,
        )?;
        tracing::debug!(
            "Fetched {} items from {} at slot {}",
            snapshot.items.len(),
            address,
            snapshot.slot
        );
        Ok(snapshot)
    }

    async fn initialize_account(&self, identity: &Identity) -> Result<(), WriteError> {
        let lamports = self
            .rpc
            .get_minimum_balance_for_rent_exemption(LINK_ACCOUNT_SPACE)
            .await
            .map_err(write_error)?;
        let instructions = initialize_instructions(
            &self.config.program_id,
            &self.account_address(),
            &identity.pubkey(),
            lamports,
        );

        let signature = self
            .submit(identity, &instructions, Some(&self.config.account))
            .await?;
        tracing::info!("Initialized link account {} ({})", self.account_address(), signature);
        Ok(())
    }

    async fn append_item(&self, identity: &Identity, link: &str) -> Result<(), WriteError> {
        let ix = instruction::append_item(
            &self.config.program_id,
            &self.account_address(),
            &identity.pubkey(),
            link,
        );

        let signature = self.submit(identity, &[ix], None).await?;
        tracing::info!("Appended link for {} ({})", identity, signature);
        Ok(())
    }
}

// ============ Helpers ============

/// Map a client failure on the write path.
///
/// A verdict from the node (preflight failure, failed transaction) or from
/// the signer is a rejection; anything else never reached one.
fn write_error(error: ClientError) -> WriteError {
    match error.kind() {
        ClientErrorKind::RpcError(RpcError::RpcResponseError { message, .. }) => {
            WriteError::Rejected(message.clone())
        }
        ClientErrorKind::TransactionError(e) => WriteError::Rejected(e.to_string()),
        ClientErrorKind::SigningError(e) => WriteError::Rejected(e.to_string()),
        _ => WriteError::Transport(error.to_string()),
    }
}

/// Decode the link account as read at `slot`
pub fn decode_account(
    address: &Pubkey,
    program_id: &Pubkey,
    slot: u64,
    account: Option<Account>,
) -> Result<AccountSnapshot, FetchError> {
    let account = account.ok_or(FetchError::NotFound(*address))?;

    let link_account = LinkAccount::unpack(&account.owner, program_id, &account.data)
        .map_err(|e| FetchError::InvalidAccount(e.to_string()))?;

    Ok(AccountSnapshot {
        address: *address,
        slot,
        items: link_account.items,
    })
}

/// Instructions that allocate and initialize the link account
pub fn initialize_instructions(
    program_id: &Pubkey,
    account: &Pubkey,
    payer: &Pubkey,
    lamports: u64,
) -> Vec<Instruction> {
    vec![
        system_instruction::create_account(
            payer,
            account,
            lamports,
            LINK_ACCOUNT_SPACE as u64,
            program_id,
        ),
        instruction::initialize_account(program_id, account, payer),
    ]
}

/// Build an unsigned transaction paid for by `payer`, optionally pre-signed
/// by `co_signer`
pub fn build_transaction(
    payer: &Pubkey,
    instructions: &[Instruction],
    blockhash: Hash,
    co_signer: Option<&Keypair>,
) -> Result<Transaction, WriteError> {
    let message = Message::new_with_blockhash(instructions, Some(payer), &blockhash);
    let mut transaction = Transaction::new_unsigned(message);

    if let Some(signer) = co_signer {
        transaction
            .try_partial_sign(&[signer], blockhash)
            .map_err(|e| WriteError::Rejected(format!("account signature: {e}")))?;
    }

    Ok(transaction)
}
