//! Declarative schemas for compound parameters.
//!
//! A [`Schema`] lists the accepted forms of a compound argument, one field
//! list per accepted item count. Reading checks the compound tag, the count
//! and every field's type tag in order, failing with the field's message on
//! the first mismatch. Handlers then pick values out of [`Args`] knowing the
//! types already line up.

use traci_core::error::{Result, ResultExt, TraciError};
use traci_core::protocol::{Reader, TypedValue, ValueType};

#[derive(Debug, Clone, Copy)]
pub struct Field {
    pub ty: ValueType,
    pub error: &'static str,
}

pub const fn field(ty: ValueType, error: &'static str) -> Field {
    Field { ty, error }
}

#[derive(Debug, Clone, Copy)]
pub struct Schema {
    pub not_compound: &'static str,
    pub bad_arity: &'static str,
    pub forms: &'static [&'static [Field]],
}

impl Schema {
    pub fn read(&self, r: &mut Reader) -> Result<Args> {
        let count = r.read_compound_header().or_invalid(self.not_compound)?;
        let form = self
            .forms
            .iter()
            .find(|f| f.len() == count)
            .ok_or_else(|| TraciError::validation(self.bad_arity))?;
        let mut values = Vec::with_capacity(count);
        for f in form.iter() {
            values.push(TypedValue::decode_as(f.ty, r).or_invalid(f.error)?);
        }
        Ok(Args(values))
    }
}

/// Decoded compound items, in wire order.
#[derive(Debug, Clone, PartialEq)]
pub struct Args(Vec<TypedValue>);

fn mismatch(i: usize) -> TraciError {
    TraciError::Internal(format!("argument {i} does not match its schema"))
}

impl Args {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn string(&self, i: usize) -> Result<&str> {
        match self.0.get(i) {
            Some(TypedValue::String(s)) => Ok(s),
            _ => Err(mismatch(i)),
        }
    }

    pub fn double(&self, i: usize) -> Result<f64> {
        match self.0.get(i) {
            Some(TypedValue::Double(v)) => Ok(*v),
            _ => Err(mismatch(i)),
        }
    }

    pub fn int(&self, i: usize) -> Result<i32> {
        match self.0.get(i) {
            Some(TypedValue::Int(v)) => Ok(*v),
            _ => Err(mismatch(i)),
        }
    }

    pub fn ubyte(&self, i: usize) -> Result<u8> {
        match self.0.get(i) {
            Some(TypedValue::UByte(v)) => Ok(*v),
            _ => Err(mismatch(i)),
        }
    }

    pub fn byte(&self, i: usize) -> Result<i8> {
        match self.0.get(i) {
            Some(TypedValue::Byte(v)) => Ok(*v),
            _ => Err(mismatch(i)),
        }
    }
}

/// Expect an empty compound (resume, reroute).
pub fn read_empty_compound(
    r: &mut Reader,
    not_compound: &'static str,
    not_empty: &'static str,
) -> Result<()> {
    let count = r.read_compound_header().or_invalid(not_compound)?;
    if count != 0 {
        return Err(TraciError::validation(not_empty));
    }
    Ok(())
}
