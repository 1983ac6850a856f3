use ethers_core::abi::{encode, Token};
use ethers_core::utils::keccak256;

/// ABI calldata for a single method call: 4-byte selector followed by the
/// encoded arguments. Encoding itself is delegated to ethers' abi module.
pub fn encode_call(signature: &str, args: &[Token]) -> Vec<u8> {
    let mut data = keccak256(signature.as_bytes())[..4].to_vec();
    data.extend(encode(args));
    data
}
