//! Token deployments accepted for on-chain payment.

use solana_pubkey::{Pubkey, pubkey};
use staybook::amount::STABLECOIN_DECIMALS;

/// USDC mint on Solana mainnet.
pub const USDC_MAINNET_MINT: Pubkey = pubkey!("EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v");

/// USDC mint on Solana devnet.
pub const USDC_DEVNET_MINT: Pubkey = pubkey!("4zMMC9srt5Ri5X14GAgXhaHii3GnPAEERYPJgZJDncDU");

/// SPL token program owning a mint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TokenProgram {
    /// Standard SPL Token program.
    #[default]
    Token,
    /// SPL Token-2022 program.
    Token2022,
}

impl TokenProgram {
    /// Returns the program id.
    #[must_use]
    pub fn id(self) -> Pubkey {
        match self {
            Self::Token => spl_token::id(),
            Self::Token2022 => spl_token_2022::id(),
        }
    }
}

/// A token mint together with what is needed to transfer it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenDeployment {
    /// Mint address.
    pub mint: Pubkey,
    /// Number of decimal places of the mint.
    pub decimals: u8,
    /// Program owning the mint.
    pub program: TokenProgram,
}

impl TokenDeployment {
    /// Creates a deployment description.
    #[must_use]
    pub const fn new(mint: Pubkey, decimals: u8, program: TokenProgram) -> Self {
        Self {
            mint,
            decimals,
            program,
        }
    }

    /// USDC on mainnet.
    #[must_use]
    pub const fn usdc_mainnet() -> Self {
        Self::new(USDC_MAINNET_MINT, stablecoin_decimals(), TokenProgram::Token)
    }

    /// USDC on devnet.
    #[must_use]
    pub const fn usdc_devnet() -> Self {
        Self::new(USDC_DEVNET_MINT, stablecoin_decimals(), TokenProgram::Token)
    }

    /// Returns the id of the program owning the mint.
    #[must_use]
    pub fn token_program(&self) -> Pubkey {
        self.program.id()
    }
}

#[allow(clippy::cast_possible_truncation)]
const fn stablecoin_decimals() -> u8 {
    STABLECOIN_DECIMALS as u8
}
