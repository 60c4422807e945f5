use anyhow::{bail, Result};

/// Column data types supported by the storage layer.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    Boolean = 1,
    Int32 = 2,
    Int64 = 3,
    Varchar = 4,
}

impl DataType {
    pub fn from_u8(value: u8) -> Result<Self> {
        match value {
            1 => Ok(DataType::Boolean),
            2 => Ok(DataType::Int32),
            3 => Ok(DataType::Int64),
            4 => Ok(DataType::Varchar),
            _ => bail!("Unknown data type: {}", value),
        }
    }
}

/// Values that can be stored in a column.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Int32(i32),
    Int64(i64),
    String(String),
}

impl Value {
    /// The data type of this value, or None for NULL.
    pub fn data_type(&self) -> Option<DataType> {
        match self {
            Value::Null => None,
            Value::Boolean(_) => Some(DataType::Boolean),
            Value::Int32(_) => Some(DataType::Int32),
            Value::Int64(_) => Some(DataType::Int64),
            Value::String(_) => Some(DataType::Varchar),
        }
    }

    /// Whether this value can be stored in a column of `data_type`.
    /// NULL is compatible with every type.
    pub fn is_compatible_with(&self, data_type: DataType) -> bool {
        match self.data_type() {
            None => true,
            Some(own) => own == data_type,
        }
    }
}

/// Serialize one row of values according to `schema`.
///
/// Layout: a NULL bitmap (one bit per column, rounded up to whole bytes)
/// followed by the non-NULL values in column order. Fixed-width types
/// are little-endian; varchars carry a u32 length prefix.
pub fn serialize_values(values: &[Value], schema: &[DataType]) -> Result<Vec<u8>> {
    if values.len() != schema.len() {
        bail!(
            "Value count {} doesn't match schema length {}",
            values.len(),
            schema.len()
        );
    }

    let null_bitmap_size = schema.len().div_ceil(8);
    let mut null_bitmap = vec![0u8; null_bitmap_size];

    for (i, (value, expected_type)) in values.iter().zip(schema.iter()).enumerate() {
        match value {
            Value::Null => {
                null_bitmap[i / 8] |= 1 << (i % 8);
            }
            _ => {
                if !value.is_compatible_with(*expected_type) {
                    bail!(
                        "Value {:?} is not compatible with type {:?}",
                        value,
                        expected_type
                    );
                }
            }
        }
    }

    let mut data = Vec::new();
    data.extend_from_slice(&null_bitmap);

    for value in values {
        match value {
            Value::Null => {}
            Value::Boolean(b) => data.push(u8::from(*b)),
            Value::Int32(i) => data.extend_from_slice(&i.to_le_bytes()),
            Value::Int64(i) => data.extend_from_slice(&i.to_le_bytes()),
            Value::String(s) => {
                let bytes = s.as_bytes();
                data.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
                data.extend_from_slice(bytes);
            }
        }
    }

    Ok(data)
}

/// Deserialize one row of values according to `schema`.
pub fn deserialize_values(data: &[u8], schema: &[DataType]) -> Result<Vec<Value>> {
    if schema.is_empty() {
        return Ok(vec![]);
    }

    let null_bitmap_size = schema.len().div_ceil(8);
    if data.len() < null_bitmap_size {
        bail!("Data too short for NULL bitmap");
    }

    let null_bitmap = &data[..null_bitmap_size];
    let mut offset = null_bitmap_size;
    let mut values = Vec::with_capacity(schema.len());

    for (i, data_type) in schema.iter().enumerate() {
        let is_null = (null_bitmap[i / 8] & (1 << (i % 8))) != 0;
        if is_null {
            values.push(Value::Null);
            continue;
        }

        match data_type {
            DataType::Boolean => {
                let &byte = data
                    .get(offset)
                    .ok_or_else(|| anyhow::anyhow!("Truncated boolean value"))?;
                values.push(Value::Boolean(byte != 0));
                offset += 1;
            }
            DataType::Int32 => {
                let bytes: [u8; 4] = data
                    .get(offset..offset + 4)
                    .ok_or_else(|| anyhow::anyhow!("Truncated int32 value"))?
                    .try_into()?;
                values.push(Value::Int32(i32::from_le_bytes(bytes)));
                offset += 4;
            }
            DataType::Int64 => {
                let bytes: [u8; 8] = data
                    .get(offset..offset + 8)
                    .ok_or_else(|| anyhow::anyhow!("Truncated int64 value"))?
                    .try_into()?;
                values.push(Value::Int64(i64::from_le_bytes(bytes)));
                offset += 8;
            }
            DataType::Varchar => {
                let len_bytes: [u8; 4] = data
                    .get(offset..offset + 4)
                    .ok_or_else(|| anyhow::anyhow!("Truncated varchar length"))?
                    .try_into()?;
                let len = u32::from_le_bytes(len_bytes) as usize;
                offset += 4;
                let bytes = data
                    .get(offset..offset + len)
                    .ok_or_else(|| anyhow::anyhow!("Truncated varchar value"))?;
                values.push(Value::String(String::from_utf8(bytes.to_vec())?));
                offset += len;
            }
        }
    }

    Ok(values)
}
