//! 公共类型定义模块
//!
//! 定义 LukaBSON 的核心类型:
//! - ObjectId: 12 字节唯一标识符(前 4 字节为大端时间戳)

use serde::{Deserialize, Serialize};

use crate::error::CommonError;

/// ObjectId - 12 字节唯一标识符
///
/// 格式:
/// - 前 4 字节: 时间戳(秒,大端)
/// - 后 8 字节: 机器/进程/计数器字段(本库只透传,不生成)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ObjectId([u8; 12]);

impl ObjectId {
    pub fn from_bytes(bytes: [u8; 12]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 12] {
        &self.0
    }

    pub fn timestamp(&self) -> u32 {
        u32::from_be_bytes([self.0[0], self.0[1], self.0[2], self.0[3]])
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, CommonError> {
        let bytes = hex::decode(s)
            .map_err(|e| CommonError::InvalidObjectId(format!("Invalid hex: {}", e)))?;
        if bytes.len() != 12 {
            return Err(CommonError::InvalidObjectId(
                "ObjectId must be 12 bytes".to_string(),
            ));
        }
        let mut arr = [0u8; 12];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_id_hex_roundtrip() {
        let id = ObjectId::from_bytes([
            0x50, 0x7f, 0x1f, 0x77, 0xbc, 0xf8, 0x6c, 0xd7, 0x99, 0x43, 0x90, 0x11,
        ]);
        assert_eq!(id.to_hex(), "507f1f77bcf86cd799439011");
        assert_eq!(ObjectId::from_hex("507f1f77bcf86cd799439011").unwrap(), id);
    }

    #[test]
    fn test_object_id_timestamp() {
        let id = ObjectId::from_bytes([0, 0, 0, 42, 0, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(id.timestamp(), 42);
    }

    #[test]
    fn test_object_id_from_hex_rejects_bad_input() {
        assert!(ObjectId::from_hex("zz").is_err());
        assert!(ObjectId::from_hex("507f1f77").is_err());
    }
}
