//! Instruction building for stablecoin transfers.

use solana_pubkey::{Pubkey, pubkey};
use solana_transaction::Instruction;
use spl_token::solana_program::instruction::AccountMeta;

use crate::chain::{TokenDeployment, TokenProgram};

/// Associated Token Account program public key.
pub const ATA_PROGRAM_PUBKEY: Pubkey = pubkey!("ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL");

/// System program public key.
pub const SYSTEM_PROGRAM_PUBKEY: Pubkey = pubkey!("11111111111111111111111111111111");

/// `CreateIdempotent` discriminator of the associated token account program.
const CREATE_IDEMPOTENT: u8 = 1;

/// Errors building the payment instructions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InstructionError {
    /// Nothing to transfer.
    #[error("transfer amount must be positive")]
    ZeroAmount,
    /// Payer and recipient are the same wallet.
    #[error("payer {0} cannot pay itself")]
    SelfPayment(Pubkey),
    /// The token program rejected the instruction arguments.
    #[error("invalid token instruction: {0}")]
    Token(String),
}

/// Derives the associated token account of `wallet` for the deployment's mint.
#[must_use]
pub fn associated_token_address(wallet: &Pubkey, deployment: &TokenDeployment) -> Pubkey {
    let (ata, _) = Pubkey::find_program_address(
        &[
            wallet.as_ref(),
            deployment.token_program().as_ref(),
            deployment.mint.as_ref(),
        ],
        &ATA_PROGRAM_PUBKEY,
    );
    ata
}

/// Creates `wallet`'s associated token account, funded by `funder`, unless it
/// already exists.
#[must_use]
pub fn create_associated_token_account_idempotent(
    funder: &Pubkey,
    wallet: &Pubkey,
    deployment: &TokenDeployment,
) -> Instruction {
    let ata = associated_token_address(wallet, deployment);
    Instruction {
        program_id: ATA_PROGRAM_PUBKEY,
        accounts: vec![
            AccountMeta::new(*funder, true),
            AccountMeta::new(ata, false),
            AccountMeta::new_readonly(*wallet, false),
            AccountMeta::new_readonly(deployment.mint, false),
            AccountMeta::new_readonly(SYSTEM_PROGRAM_PUBKEY, false),
            AccountMeta::new_readonly(deployment.token_program(), false),
        ],
        data: vec![CREATE_IDEMPOTENT],
    }
}

/// Builds the instructions paying `amount` base units from `payer` to
/// `recipient`.
///
/// Returns, in order: create payer ATA (idempotent), create recipient ATA
/// (idempotent), `transfer_checked`. The payer funds both accounts.
///
/// # Errors
///
/// Returns [`InstructionError`] for a zero amount, a self-payment, or
/// arguments the token program rejects.
pub fn build_payment_instructions(
    payer: &Pubkey,
    recipient: &Pubkey,
    deployment: &TokenDeployment,
    amount: u64,
) -> Result<Vec<Instruction>, InstructionError> {
    if amount == 0 {
        return Err(InstructionError::ZeroAmount);
    }
    if payer == recipient {
        return Err(InstructionError::SelfPayment(*payer));
    }

    let source_ata = associated_token_address(payer, deployment);
    let destination_ata = associated_token_address(recipient, deployment);
    let token_program = deployment.token_program();

    let transfer = match deployment.program {
        TokenProgram::Token => spl_token::instruction::transfer_checked(
            &token_program,
            &source_ata,
            &deployment.mint,
            &destination_ata,
            payer,
            &[],
            amount,
            deployment.decimals,
        ),
        TokenProgram::Token2022 => spl_token_2022::instruction::transfer_checked(
            &token_program,
            &source_ata,
            &deployment.mint,
            &destination_ata,
            payer,
            &[],
            amount,
            deployment.decimals,
        ),
    }
    .map_err(|e| InstructionError::Token(e.to_string()))?;

    Ok(vec![
        create_associated_token_account_idempotent(payer, payer, deployment),
        create_associated_token_account_idempotent(payer, recipient, deployment),
        transfer,
    ])
}
