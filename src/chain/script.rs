use crate::error::{Error, Result};

use super::Payload;

const OP_0: u8 = 0x00;
const OP_1: u8 = 0x51;
const OP_DUP: u8 = 0x76;
const OP_HASH160: u8 = 0xa9;
const OP_EQUAL: u8 = 0x87;
const OP_EQUALVERIFY: u8 = 0x88;
const OP_CHECKSIG: u8 = 0xac;

/// Builds the locking script that pays to the decoded address.
pub fn pay_to_address_script(payload: &Payload) -> Result<Vec<u8>> {
    let script = match payload {
        Payload::PubKeyHash(hash) => {
            let mut script = vec![OP_DUP, OP_HASH160, 20];
            script.extend_from_slice(hash);
            script.extend_from_slice(&[OP_EQUALVERIFY, OP_CHECKSIG]);
            script
        }
        Payload::ScriptHash(hash) => {
            let mut script = vec![OP_HASH160, 20];
            script.extend_from_slice(hash);
            script.push(OP_EQUAL);
            script
        }
        Payload::WitnessProgram { version, program } => {
            let opcode = match (*version, program.len()) {
                (0, 20) | (0, 32) => OP_0,
                (1, 32) => OP_1,
                (version, len) => {
                    return Err(Error::ScriptBuild(format!(
                        "no standard script for witness version {version} with {len} byte program"
                    )))
                }
            };
            let mut script = vec![opcode, program.len() as u8];
            script.extend_from_slice(program);
            script
        }
    };
    Ok(script)
}
