use std::path::{Path, PathBuf};

use async_trait::async_trait;
use solana_sdk::{
    hash::Hash,
    pubkey::Pubkey,
    signature::{read_keypair_file, Keypair, Signer},
    transaction::Transaction,
};

use crate::error::ClientError;

/// Wallet collaborator: owns the requester identity and signs requests.
#[async_trait]
pub trait Wallet: Send + Sync {
    async fn connect(&mut self) -> Result<Pubkey, ClientError>;

    /// `None` until [`Wallet::connect`] succeeds.
    fn public_key(&self) -> Option<Pubkey>;

    fn sign(&self, tx: &mut Transaction, blockhash: Hash) -> Result<(), ClientError>;
}

/// Wallet backed by a Solana CLI JSON keypair file.
pub struct KeypairWallet {
    path: PathBuf,
    keypair: Option<Keypair>,
}

impl KeypairWallet {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), keypair: None }
    }

    /// Wallet that is already connected with `keypair`.
    pub fn from_keypair(keypair: Keypair) -> Self {
        Self { path: PathBuf::new(), keypair: Some(keypair) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl Wallet for KeypairWallet {
    async fn connect(&mut self) -> Result<Pubkey, ClientError> {
        if let Some(ref kp) = self.keypair {
            return Ok(kp.pubkey());
        }
        let kp = read_keypair_file(&self.path).map_err(|e| {
            ClientError::Keypair(format!("reading {}: {e}", self.path.display()))
        })?;
        let pubkey = kp.pubkey();
        tracing::info!(%pubkey, "Loaded wallet keypair from {:?}", self.path);
        self.keypair = Some(kp);
        Ok(pubkey)
    }

    fn public_key(&self) -> Option<Pubkey> {
        self.keypair.as_ref().map(Keypair::pubkey)
    }

    fn sign(&self, tx: &mut Transaction, blockhash: Hash) -> Result<(), ClientError> {
        let kp = self.keypair.as_ref().ok_or(ClientError::NotConnected)?;
        tx.try_sign(&[kp], blockhash)
            .map_err(|e| ClientError::Signing(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::{instruction::Instruction, message::Message};

    #[tokio::test]
    async fn missing_keypair_file_fails_to_connect() {
        let mut wallet = KeypairWallet::new("/nonexistent/gpt-oracle-test-id.json");
        assert!(matches!(wallet.connect().await, Err(ClientError::Keypair(_))));
        assert_eq!(wallet.public_key(), None);
    }

    #[test]
    fn unconnected_wallet_cannot_sign() {
        let wallet = KeypairWallet::new("unused.json");
        let payer = Pubkey::new_unique();
        let ix = Instruction::new_with_bytes(Pubkey::new_unique(), &[], vec![]);
        let mut tx = Transaction::new_unsigned(Message::new(&[ix], Some(&payer)));
        assert!(matches!(
            wallet.sign(&mut tx, Hash::new_unique()),
            Err(ClientError::NotConnected)
        ));
    }

    #[tokio::test]
    async fn connected_wallet_signs_as_fee_payer() {
        let kp = Keypair::new();
        let payer = kp.pubkey();
        let mut wallet = KeypairWallet::from_keypair(kp);
        assert_eq!(wallet.connect().await.unwrap(), payer);

        let ix = Instruction::new_with_bytes(Pubkey::new_unique(), &[], vec![]);
        let mut tx = Transaction::new_with_payer(&[ix], Some(&payer));
        wallet.sign(&mut tx, Hash::new_unique()).unwrap();
        assert!(tx.is_signed());
    }
}
