//! Status sections and typed responses.

use super::frame::{write_command, RawCommand};
use super::storage::Storage;
use super::value::TypedValue;
use crate::error::{Result, ResultCode, TraciError};

/// `[commandID][result:u8][description:string]`, framed as a command.
#[derive(Debug, Clone, PartialEq)]
pub struct Status {
    pub command_id: u8,
    pub result: ResultCode,
    pub description: String,
}

impl Status {
    pub fn ok(command_id: u8) -> Self {
        Self {
            command_id,
            result: ResultCode::Ok,
            description: String::new(),
        }
    }

    pub fn error(command_id: u8, err: &TraciError) -> Self {
        Self {
            command_id,
            result: err.result_code(),
            description: err.to_string(),
        }
    }

    pub fn encode(&self, out: &mut Storage) -> Result<()> {
        let mut content = Storage::new();
        content.write_u8(self.result.as_u8());
        content.write_string(&self.description)?;
        write_command(out, self.command_id, content.as_slice())
    }

    /// Parse a status command (client side / tests).
    pub fn parse(cmd: &RawCommand) -> Result<Status> {
        let mut r = cmd.reader();
        let code = r.read_u8()?;
        let result = ResultCode::from_u8(code)
            .ok_or_else(|| TraciError::Protocol(format!("unknown result code 0x{code:02x}")))?;
        let description = r.read_string()?;
        Ok(Status {
            command_id: cmd.id,
            result,
            description,
        })
    }
}

/// Payload of a successful get: `[variable][objectID][typed value]`.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableResponse {
    pub response_id: u8,
    pub variable: u8,
    pub object_id: String,
    pub value: TypedValue,
}

impl VariableResponse {
    pub fn encode(&self, out: &mut Storage) -> Result<()> {
        let mut content = Storage::new();
        content.write_u8(self.variable);
        content.write_string(&self.object_id)?;
        self.value.encode(&mut content)?;
        write_command(out, self.response_id, content.as_slice())
    }

    pub fn parse(cmd: &RawCommand) -> Result<VariableResponse> {
        let mut r = cmd.reader();
        let variable = r.read_u8()?;
        let object_id = r.read_string()?;
        let value = TypedValue::decode(&mut r)?;
        Ok(VariableResponse {
            response_id: cmd.id,
            variable,
            object_id,
            value,
        })
    }
}
