//! Plain-text command messages signed with the personal-message prefix.

use alloy_primitives::{eip191_hash_message, Address, B256};

/// `keccak256("\x19Ethereum Signed Message:\n" || len(text) || text)`.
pub fn hash_plain_message(text: &str) -> B256 {
    eip191_hash_message(text.as_bytes())
}

/// Message an owner signs to cancel one of their orders.
pub fn cancel_order_message(chain_id: u64, order_id: &str) -> String {
    format!("cancelorder2:{}:{}", chain_id, order_id)
}

/// Message a signer key signs to register itself as a delegate of `owner`.
pub fn add_signer_message(owner: &Address) -> String {
    format!("addvaultsigner:{:#x}", owner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_message_vector() {
        let expected: B256 = "0xd9eba16ed0ecae432b71fe008c98cc872bb4cc214d3220a36f365326cf807d68"
            .parse()
            .unwrap();
        assert_eq!(hash_plain_message("hello world"), expected);
    }

    #[test]
    fn test_command_messages() {
        assert_eq!(cancel_order_message(42161, "0xabc"), "cancelorder2:42161:0xabc");

        let owner: Address = "0xF39Fd6e51aad88F6F4ce6aB8827279cffFb92266".parse().unwrap();
        assert_eq!(
            add_signer_message(&owner),
            "addvaultsigner:0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"
        );
    }
}
