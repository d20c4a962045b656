//! Parent-chain transaction helpers needed by merge mining

use crate::constants::SEQUENCE_FINAL;
use crate::hash::{sha256d, MerkleHasher};
use crate::serialize::hash_preimage;
use crate::types::*;

/// Txid: SHA256(SHA256(serialized tx))
pub fn calculate_tx_id(tx: &Transaction) -> Hash {
    sha256d(&hash_preimage(tx))
}

/// Txid computed through an arbitrary hasher
pub fn calculate_tx_id_with<H: MerkleHasher + ?Sized>(hasher: &H, tx: &Transaction) -> Hash {
    hasher.hash(&hash_preimage(tx))
}

/// Check if transaction is coinbase
pub fn is_coinbase(tx: &Transaction) -> bool {
    tx.inputs.len() == 1 && tx.inputs[0].prevout.is_null()
}

/// Input script of the first input, which carries merge-mining commitments
pub fn coinbase_script(tx: &Transaction) -> Option<&[u8]> {
    tx.inputs.first().map(|input| input.script_sig.as_slice())
}

/// Build a coinbase spending the null outpoint with the given script
pub fn create_coinbase_transaction(
    script_sig: ByteString,
    outputs: Vec<TransactionOutput>,
) -> Transaction {
    let coinbase_input = TransactionInput {
        prevout: OutPoint::null(),
        script_sig,
        sequence: SEQUENCE_FINAL,
    };

    Transaction {
        version: 1,
        inputs: vec![coinbase_input],
        outputs,
        lock_time: 0,
    }
}

/// Wrap raw bytes into a single script data push
pub fn push_data(data: &[u8]) -> ByteString {
    // OP_PUSHDATA1 / OP_PUSHDATA2 / OP_PUSHDATA4
    let mut script = Vec::with_capacity(data.len() + 5);
    match data.len() {
        len @ 0..=0x4b => script.push(len as u8),
        len @ 0x4c..=0xff => {
            script.push(0x4c);
            script.push(len as u8);
        }
        len @ 0x100..=0xffff => {
            script.push(0x4d);
            script.extend_from_slice(&(len as u16).to_le_bytes());
        }
        len => {
            script.push(0x4e);
            script.extend_from_slice(&(len as u32).to_le_bytes());
        }
    }
    script.extend_from_slice(data);
    script
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_coinbase_true() {
        let tx = create_coinbase_transaction(vec![0x51], vec![]);
        assert!(is_coinbase(&tx));
    }

    #[test]
    fn test_is_coinbase_false() {
        let mut tx = create_coinbase_transaction(vec![0x51], vec![]);
        tx.inputs[0].prevout.index = 0;
        assert!(!is_coinbase(&tx));
    }

    #[test]
    fn test_coinbase_script_missing_input() {
        let tx = Transaction {
            version: 1,
            inputs: vec![],
            outputs: vec![],
            lock_time: 0,
        };
        assert!(coinbase_script(&tx).is_none());
    }

    #[test]
    fn test_tx_id_changes_with_script() {
        let tx1 = create_coinbase_transaction(vec![0x51], vec![]);
        let tx2 = create_coinbase_transaction(vec![0x52], vec![]);
        assert_ne!(calculate_tx_id(&tx1), calculate_tx_id(&tx2));
        assert_eq!(calculate_tx_id(&tx1), calculate_tx_id(&tx1.clone()));
    }

    #[test]
    fn test_push_data_small() {
        let script = push_data(&[0xaa; 44]);
        assert_eq!(script[0], 44);
        assert_eq!(script.len(), 45);
    }

    #[test]
    fn test_push_data_pushdata1() {
        let script = push_data(&[0xaa; 80]);
        assert_eq!(&script[..2], &[0x4c, 80]);
        assert_eq!(script.len(), 82);
    }
}
