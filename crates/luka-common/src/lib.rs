//! LukaBSON 公共类型库
//!
//! 存放解码器与上层组件共享的原语类型:
//! - ObjectId: 12 字节唯一标识符(与 MongoDB ObjectId 布局一致)

pub mod error;
pub mod types;

pub use error::{CommonError, CommonResult};
pub use types::ObjectId;
